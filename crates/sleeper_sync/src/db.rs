//! Database connection utilities.

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

/// Pragmas applied to every file-backed SQLite connection.
///
/// - WAL lets readers proceed while a sync is writing
/// - wait up to 5 seconds on a locked database instead of failing
/// - NORMAL synchronous is safe with WAL and faster than FULL
const SQLITE_PRAGMAS: [&str; 3] = [
    "PRAGMA journal_mode=WAL",
    "PRAGMA busy_timeout=5000",
    "PRAGMA synchronous=NORMAL",
];

async fn configure_sqlite(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    for pragma in SQLITE_PRAGMAS {
        db.execute(Statement::from_string(backend, pragma.to_string()))
            .await?;
    }
    Ok(())
}

/// Establish a connection to the database.
///
/// `database_url` is a sea-orm connection string such as
/// `sqlite://sleeper-sync.db?mode=rwc` or `postgres:///sleeper`. File-backed
/// SQLite databases get the settings in [`SQLITE_PRAGMAS`].
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    if database_url.starts_with("sqlite://") {
        configure_sqlite(&db).await?;
    }

    tracing::debug!(backend = ?db.get_database_backend(), "Connected to database");
    Ok(db)
}

/// Establish a connection to the database and run all pending migrations.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established or migrations fail.
#[cfg(feature = "migrate")]
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    use sea_orm_migration::MigratorTrait;

    let db = connect(database_url).await?;
    crate::migration::Migrator::up(&db, None).await?;
    tracing::debug!("Database migrations applied");
    Ok(db)
}
