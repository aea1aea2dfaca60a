//! Sleeper Sync CLI - keeps a local copy of Sleeper fantasy league data.

mod commands;
mod config;
mod progress;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::sync::SyncTarget;

#[derive(Parser)]
#[command(name = "sleeper-sync")]
#[command(version)]
#[command(about = "Sync Sleeper fantasy league data into a local database")]
#[command(
    long_about = "sleeper-sync fetches league metadata, rosters, users, matchups, the NFL \
player catalog, and trending players from the read-only Sleeper API and upserts them into a \
local database. Repeated runs update documents in place instead of duplicating them."
)]
#[command(after_long_help = r#"EXAMPLES
    Sync everything for the configured leagues:
        $ sleeper-sync all

    Sync matchups for a specific week:
        $ sleeper-sync matchups --week 3

    Sync one league only:
        $ sleeper-sync --league 784462448236363776 rosters

    Check the API without touching stored documents:
        $ sleeper-sync --no-store all

CONFIGURATION
    sleeper-sync reads configuration from:
      1. ~/.config/sleeper-sync/config.toml (or $XDG_CONFIG_HOME/sleeper-sync/config.toml)
      2. ./sleeper-sync.toml
      3. Environment variables (SLEEPER_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    SLEEPER_LEAGUE_IDS        Comma-separated league ids
    SLEEPER_LEAGUE_ID         A single league id
    SLEEPER_DATABASE_URL      Database connection string (default: ~/.local/state/sleeper-sync/sleeper-sync.db)
    RUST_LOG                  Log filter (default: sleeper_sync=info,sleeper_sync_cli=info)
"#)]
struct Cli {
    /// Only sync this league (overrides configured league ids)
    #[arg(short, long, global = true)]
    league: Option<String>,

    /// Fetch without writing documents (the player snapshot is still written)
    #[arg(long, global = true)]
    no_store: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Sync league metadata
    League,
    /// Sync rosters
    Rosters,
    /// Sync rosters, then the users who own them
    Users,
    /// Sync the current NFL season state
    State,
    /// Sync season state, then matchups for the current (or given) week
    Matchups {
        /// Week to sync instead of the current week
        #[arg(short, long)]
        week: Option<i64>,
    },
    /// Sync the player catalog (at most once per refresh interval)
    Players,
    /// Sync today's trending adds and drops
    Trending,
    /// Run every routine in dependency order
    All,
}

#[derive(Debug, Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

impl Commands {
    fn sync_target(&self) -> Option<SyncTarget> {
        Some(match self {
            Commands::Migrate { .. } => return None,
            Commands::League => SyncTarget::League,
            Commands::Rosters => SyncTarget::Rosters,
            Commands::Users => SyncTarget::Users,
            Commands::State => SyncTarget::State,
            Commands::Matchups { week } => SyncTarget::Matchups { week: *week },
            Commands::Players => SyncTarget::Players,
            Commands::Trending => SyncTarget::Trending,
            Commands::All => SyncTarget::All,
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("sleeper_sync=info,sleeper_sync_cli=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load()?;

    let database_url = config
        .database_url()
        .ok_or("Could not determine a database URL; set SLEEPER_DATABASE_URL")?;

    // Ensure the database directory exists for SQLite
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        // Strip query parameters (e.g., ?mode=rwc) before path operations
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "Database path '{}' is relative - behavior depends on current directory. \
                 Consider using an absolute path.",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }

    match cli.command.sync_target() {
        None => {
            if let Commands::Migrate { action } = cli.command {
                commands::migrate::handle_migrate(action, &database_url).await?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(target) => {
            let failed =
                commands::sync::handle_sync(
                    target,
                    &config,
                    &database_url,
                    cli.league,
                    !cli.no_store,
                )
                .await?;
            Ok(if failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn matchups_week_and_global_league_parse() {
        let cli = Cli::try_parse_from(["sleeper-sync", "matchups", "--week", "3", "--league", "42"])
            .expect("args should parse");
        assert_eq!(cli.league.as_deref(), Some("42"));
        assert_eq!(
            cli.command.sync_target(),
            Some(SyncTarget::Matchups { week: Some(3) })
        );
    }

    #[test]
    fn no_store_flag_is_global_and_off_by_default() {
        let cli = Cli::try_parse_from(["sleeper-sync", "trending"]).expect("parse");
        assert!(!cli.no_store);

        let cli = Cli::try_parse_from(["sleeper-sync", "users", "--no-store"]).expect("parse");
        assert!(cli.no_store);
        assert_eq!(cli.command.sync_target(), Some(SyncTarget::Users));
    }

    #[test]
    fn migrate_is_not_a_sync_target() {
        let cli = Cli::try_parse_from(["sleeper-sync", "migrate", "status"]).expect("parse");
        assert!(cli.command.sync_target().is_none());
    }

    #[test]
    fn all_maps_to_full_run() {
        let cli = Cli::try_parse_from(["sleeper-sync", "all"]).expect("parse");
        assert_eq!(cli.command.sync_target(), Some(SyncTarget::All));
    }
}
