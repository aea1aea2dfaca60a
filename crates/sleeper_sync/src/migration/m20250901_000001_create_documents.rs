//! Create the `documents` table backing every collection.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Documents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Documents::Collection).string().not_null())
                    .col(ColumnDef::new(Documents::NaturalKey).text().not_null())
                    .col(
                        ColumnDef::new(Documents::Body)
                            .json()
                            .not_null()
                            .default(Expr::cust("'{}'")),
                    )
                    .col(
                        ColumnDef::new(Documents::Revision)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Documents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Documents::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one document per natural key within a collection
        manager
            .create_index(
                Index::create()
                    .name("idx_documents_collection_key")
                    .table(Documents::Table)
                    .col(Documents::Collection)
                    .col(Documents::NaturalKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Most-recent lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_documents_collection_revision")
                    .table(Documents::Table)
                    .col(Documents::Collection)
                    .col(Documents::Revision)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Documents::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Documents {
    Table,
    Id,
    Collection,
    NaturalKey,
    Body,
    Revision,
    CreatedAt,
    UpdatedAt,
}
