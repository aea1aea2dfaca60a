//! Path builders for the endpoints this crate consumes.

/// NFL season state (current season, week and phase).
pub const SEASON_STATE: &str = "/state/nfl";

/// Full NFL player catalog. Sleeper asks clients to call this at most once a day.
pub const PLAYERS: &str = "/players/nfl";

/// Players trending by adds over the last 24 hours.
pub const TRENDING_ADD: &str = "/players/nfl/trending/add";

/// Players trending by drops over the last 24 hours.
pub const TRENDING_DROP: &str = "/players/nfl/trending/drop";

pub fn league(league_id: &str) -> String {
    format!("/league/{league_id}")
}

pub fn rosters(league_id: &str) -> String {
    format!("/league/{league_id}/rosters")
}

pub fn matchups(league_id: &str, week: i64) -> String {
    format!("/league/{league_id}/matchups/{week}")
}

pub fn user(user_id: &str) -> String {
    format!("/user/{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn league_scoped_paths() {
        assert_eq!(league("784"), "/league/784");
        assert_eq!(rosters("784"), "/league/784/rosters");
        assert_eq!(matchups("784", 5), "/league/784/matchups/5");
    }

    #[test]
    fn user_path() {
        assert_eq!(user("12345"), "/user/12345");
    }
}
