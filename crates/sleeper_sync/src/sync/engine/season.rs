//! Season state and the matchups that depend on it.

use serde_json::Value;

use super::LeagueSync;
use crate::api::endpoints;
use crate::store::{Document, NaturalKey};
use crate::sync::error::SyncError;
use crate::sync::types::{Resource, SyncOutcome};

const SEASON: &str = "season";
const WEEK: &str = "week";
const LEAGUE_ID: &str = "league_id";

const SEASON_STATE_KEY: &[&str] = &[SEASON, WEEK];
const MATCHUP_KEY: &[&str] = &["matchup_id", "roster_id", LEAGUE_ID, WEEK, SEASON];

impl LeagueSync<'_> {
    /// Fetch the current season state, keyed by (season, week).
    pub async fn sync_season_state(&self) -> Result<SyncOutcome, SyncError> {
        self.season_state_pass().await.map(|(outcome, _)| outcome)
    }

    /// Season state routine that also hands back the fetched state.
    async fn season_state_pass(&self) -> Result<(SyncOutcome, Document), SyncError> {
        let mut fetched = Document::new();
        let outcome = self
            .track(Resource::SeasonState, async {
                let record = self
                    .fetch_document(Resource::SeasonState, endpoints::SEASON_STATE)
                    .await?;

                let collection = &self.config.collections.season_state;
                let count = self
                    .persist(
                        collection,
                        |record: &Document| {
                            NaturalKey::from_fields(collection, record, SEASON_STATE_KEY)
                        },
                        vec![record.clone()],
                    )
                    .await?;
                fetched = record;
                Ok(self.outcome(count))
            })
            .await?;
        Ok((outcome, fetched))
    }

    /// Fetch the matchups of one week.
    ///
    /// Season state is refreshed first. The season always comes from the
    /// most recently stored state (the fetched one in fetch-only mode); the
    /// week comes from `week` when given, otherwise from that state as well.
    /// Every matchup is tagged with the league, season, and week it was
    /// fetched under.
    pub async fn sync_matchups(&self, week: Option<i64>) -> Result<SyncOutcome, SyncError> {
        let (_, fetched_state) = self.season_state_pass().await?;

        self.track(Resource::Matchups, async {
            let state = if self.store_documents {
                self.store
                    .last(&self.config.collections.season_state)
                    .await?
                    .ok_or(SyncError::MissingContext {
                        what: "season state",
                    })?
            } else {
                fetched_state
            };
            let (season, week) = matchup_context(&state, week)?;

            tracing::debug!(league_id = %self.league_id, %season, week, "Fetching matchups");

            let path = endpoints::matchups(&self.league_id, week);
            let mut matchups = self.fetch_documents(Resource::Matchups, &path).await?;
            for matchup in &mut matchups {
                matchup.insert(WEEK.to_string(), Value::from(week));
                matchup.insert(SEASON.to_string(), season.clone());
                matchup.insert(LEAGUE_ID.to_string(), Value::String(self.league_id.clone()));
            }

            let collection = &self.config.collections.matchups;
            let count = self
                .persist(
                    collection,
                    |record: &Document| NaturalKey::from_fields(collection, record, MATCHUP_KEY),
                    matchups,
                )
                .await?;
            Ok(self.outcome(count))
        })
        .await
    }
}

/// Season and week to fetch matchups for.
fn matchup_context(state: &Document, week_override: Option<i64>) -> Result<(Value, i64), SyncError> {
    let season = match state.get(SEASON) {
        Some(Value::Null) | None => return Err(SyncError::MissingContext { what: "season" }),
        Some(season) => season.clone(),
    };

    let week = match week_override {
        Some(week) => week,
        None => state
            .get(WEEK)
            .and_then(week_number)
            .ok_or(SyncError::MissingContext { what: "week" })?,
    };

    Ok((season, week))
}

/// Weeks are integers, but tolerate them arriving as numeric strings.
fn week_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
