use std::sync::Arc;

use sleeper_sync::store::DocumentStore;
use sleeper_sync::{
    LeagueSync, Resource, ResourceReport, SleeperClient, SqlDocumentStore, SyncConfig,
    SyncOutcome, connect_and_migrate,
};

use crate::config::Config;
use crate::progress::LoggingReporter;

/// Which routine(s) to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyncTarget {
    League,
    Rosters,
    Users,
    State,
    Matchups { week: Option<i64> },
    Players,
    Trending,
    All,
}

/// Run `target` for every selected league. Returns the number of failed routines.
pub(crate) async fn handle_sync(
    target: SyncTarget,
    config: &Config,
    database_url: &str,
    league: Option<String>,
    store: bool,
) -> Result<usize, Box<dyn std::error::Error>> {
    // Configuration problems are fatal before anything is fetched.
    let league_ids = match league {
        Some(id) => sleeper_sync::league_ids([id])?,
        None => config.league_ids()?,
    };
    let sync_config = config.sync_config()?;

    let db = connect_and_migrate(database_url).await?;
    let document_store: Arc<dyn DocumentStore> = Arc::new(SqlDocumentStore::new(db));
    let client = SleeperClient::new(&sync_config)?;
    let on_progress = LoggingReporter::new().into_callback();

    tracing::info!(leagues = league_ids.len(), ?target, store, "Starting sync");

    let mut reports = Vec::new();
    for league_id in league_ids {
        let sync = LeagueSync::new(league_id, client.clone(), document_store.clone(), &sync_config)
            .with_progress(&on_progress)
            .with_store(store);
        reports.extend(run_target(&sync, target).await);
    }

    print_summary(&reports, &sync_config);
    Ok(reports.iter().filter(|r| r.is_failure()).count())
}

async fn run_target(sync: &LeagueSync<'_>, target: SyncTarget) -> Vec<ResourceReport> {
    let (resource, result) = match target {
        SyncTarget::All => return sync.sync_all().await,
        SyncTarget::League => (Resource::League, sync.sync_league().await),
        SyncTarget::Rosters => (Resource::Rosters, sync.sync_rosters().await),
        SyncTarget::Users => (Resource::Users, sync.sync_users().await),
        SyncTarget::State => (Resource::SeasonState, sync.sync_season_state().await),
        SyncTarget::Matchups { week } => (Resource::Matchups, sync.sync_matchups(week).await),
        SyncTarget::Players => (Resource::Players, sync.sync_players().await),
        SyncTarget::Trending => (Resource::Trending, sync.sync_trending().await),
    };

    vec![ResourceReport {
        league_id: sync.league_id().to_string(),
        resource,
        result,
    }]
}

fn print_summary(reports: &[ResourceReport], config: &SyncConfig) {
    println!();
    for report in reports {
        let status = match &report.result {
            Ok(SyncOutcome::Stored { count }) => format!("stored {count}"),
            Ok(SyncOutcome::Fetched { count }) => format!("fetched {count} (not stored)"),
            Ok(SyncOutcome::Skipped) => "skipped (fresh)".to_string(),
            Err(e) if e.is_partial() => format!("PARTIAL: {e}"),
            Err(e) => format!("FAILED: {e}"),
        };
        println!("{:<22} {:<14} {}", report.league_id, report.resource.as_str(), status);
    }

    if reports
        .iter()
        .any(|r| {
            r.resource == Resource::Players
                && matches!(
                    r.result,
                    Ok(SyncOutcome::Stored { .. } | SyncOutcome::Fetched { .. })
                )
        })
    {
        println!(
            "\nPlayer snapshot: {}",
            config.player_snapshot_path.display()
        );
    }

    let failed = reports.iter().filter(|r| r.is_failure()).count();
    if failed > 0 {
        println!("\n{failed} of {} routines failed.", reports.len());
    }
}
