//! The player catalog: large, global, and refreshed at most once per interval.

use std::path::Path;

use chrono::Utc;
use serde_json::Value;

use super::LeagueSync;
use crate::api::endpoints;
use crate::store::{Document, NaturalKey, upsert};
use crate::sync::error::SyncError;
use crate::sync::progress::{SyncProgress, emit};
use crate::sync::types::{Resource, SyncOutcome};

const PLAYER_ID: &str = "player_id";

impl LeagueSync<'_> {
    /// Fetch the full player catalog when the freshness gate allows it.
    ///
    /// The gate is marked before the request, so a failed download still
    /// waits out the interval. On success the catalog is written to the
    /// snapshot file, upserted per player unless in fetch-only mode, and the
    /// gate is re-marked with the completion time.
    pub async fn sync_players(&self) -> Result<SyncOutcome, SyncError> {
        self.track(Resource::Players, async {
            let resource = Resource::Players.as_str();
            if !self
                .gate
                .try_open(resource, self.config.player_refresh_interval)
                .await?
            {
                return Ok(SyncOutcome::Skipped);
            }

            let players = self
                .fetch_document(Resource::Players, endpoints::PLAYERS)
                .await?;

            let path = &self.config.player_snapshot_path;
            write_snapshot(path, &players).await?;
            emit(
                self.on_progress,
                SyncProgress::SnapshotWritten {
                    path: path.clone(),
                    players: players.len(),
                },
            );

            let collection = &self.config.collections.players;
            let mut count = 0usize;
            for (player_id, player) in players {
                let Value::Object(record) = player else {
                    return Err(SyncError::decode(
                        Resource::Players,
                        format!("player {player_id} is not an object"),
                    ));
                };
                if self.store_documents {
                    let key = NaturalKey::single(PLAYER_ID, player_id);
                    upsert(self.store.as_ref(), collection, &key, &record).await?;
                }
                count += 1;
            }

            self.gate.mark_fetched(resource, Utc::now()).await?;
            Ok(self.outcome(count))
        })
        .await
    }
}

/// Replace the snapshot at `path` with pretty-printed `players`.
///
/// The file is written beside the target and renamed into place, so readers
/// never see a partial snapshot.
pub async fn write_snapshot(path: &Path, players: &Document) -> Result<(), SyncError> {
    let snapshot_err = |source: std::io::Error| SyncError::Snapshot {
        path: path.to_path_buf(),
        source,
    };

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(snapshot_err)?;
        }
        _ => {}
    }

    let bytes = serde_json::to_vec_pretty(players)
        .map_err(|e| snapshot_err(std::io::Error::other(e)))?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, &bytes)
        .await
        .map_err(snapshot_err)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(snapshot_err)?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote player snapshot");
    Ok(())
}
