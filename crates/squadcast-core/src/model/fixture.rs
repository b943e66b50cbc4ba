// Fixtures, gameweeks, per-match history and the bootstrap snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::player::Player;
use super::team::{Team, TeamTable};

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// A match between two clubs. `event` is `None` while unscheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u32,
    #[serde(default)]
    pub event: Option<u32>,
    pub team_h: u32,
    pub team_a: u32,
    /// Difficulty for the home side, 1 (easiest) to 5 (hardest).
    pub team_h_difficulty: u8,
    /// Difficulty for the away side.
    pub team_a_difficulty: u8,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub kickoff_time: Option<DateTime<Utc>>,
}

impl Fixture {
    pub fn involves(&self, team_id: u32) -> bool {
        self.team_h == team_id || self.team_a == team_id
    }

    /// `Some(true)` when the team plays at home, `Some(false)` away, `None`
    /// when the team is not in this fixture.
    pub fn is_home_for(&self, team_id: u32) -> Option<bool> {
        if self.team_h == team_id {
            Some(true)
        } else if self.team_a == team_id {
            Some(false)
        } else {
            None
        }
    }

    /// Difficulty rating for the given team's side of the fixture.
    pub fn difficulty_for(&self, team_id: u32) -> Option<u8> {
        self.is_home_for(team_id).map(|home| {
            if home {
                self.team_h_difficulty
            } else {
                self.team_a_difficulty
            }
        })
    }

    pub fn opponent_of(&self, team_id: u32) -> Option<u32> {
        self.is_home_for(team_id)
            .map(|home| if home { self.team_a } else { self.team_h })
    }
}

// ---------------------------------------------------------------------------
// Gameweek
// ---------------------------------------------------------------------------

/// A numbered round ("event" upstream).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gameweek {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub deadline_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_next: bool,
}

// ---------------------------------------------------------------------------
// Per-match history
// ---------------------------------------------------------------------------

/// One past match for a player, from `element-summary/{id}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchHistory {
    pub round: u32,
    pub total_points: i32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub fixture: u32,
    #[serde(default)]
    pub was_home: bool,
    #[serde(default)]
    pub opponent_team: u32,
}

/// The parts of `element-summary/{id}/` we use. History is oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    #[serde(default)]
    pub history: Vec<MatchHistory>,
}

// ---------------------------------------------------------------------------
// Bootstrap snapshot
// ---------------------------------------------------------------------------

/// The `bootstrap-static/` snapshot: every player, club and gameweek.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bootstrap {
    #[serde(rename = "elements")]
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    #[serde(rename = "events")]
    pub gameweeks: Vec<Gameweek>,
}

impl Bootstrap {
    pub fn player(&self, id: u32) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn team_table(&self) -> TeamTable {
        TeamTable::new(&self.teams)
    }

    /// The gameweek flagged current. Upstream guarantees at most one; the
    /// first match wins if that ever breaks.
    pub fn current_gameweek(&self) -> Option<&Gameweek> {
        self.gameweeks.iter().find(|g| g.is_current)
    }

    pub fn next_gameweek(&self) -> Option<&Gameweek> {
        self.gameweeks.iter().find(|g| g.is_next)
    }

    /// The gameweek predictions should target: the next one if flagged,
    /// otherwise the current one, otherwise 1 (pre-season).
    pub fn target_gameweek(&self) -> u32 {
        self.next_gameweek()
            .or_else(|| self.current_gameweek())
            .map(|g| g.id)
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Fixture {
        Fixture {
            id: 10,
            event: Some(7),
            team_h: 1,
            team_a: 2,
            team_h_difficulty: 2,
            team_a_difficulty: 4,
            finished: false,
            kickoff_time: None,
        }
    }

    #[test]
    fn sides_and_difficulty() {
        let f = fixture();
        assert_eq!(f.is_home_for(1), Some(true));
        assert_eq!(f.is_home_for(2), Some(false));
        assert_eq!(f.is_home_for(3), None);
        assert_eq!(f.difficulty_for(1), Some(2));
        assert_eq!(f.difficulty_for(2), Some(4));
        assert_eq!(f.difficulty_for(3), None);
        assert_eq!(f.opponent_of(1), Some(2));
        assert_eq!(f.opponent_of(2), Some(1));
        assert!(!f.involves(3));
    }

    #[test]
    fn deserializes_unscheduled_fixture() {
        let json = r#"{
            "id": 99, "event": null, "team_h": 3, "team_a": 4,
            "team_h_difficulty": 3, "team_a_difficulty": 3,
            "finished": false, "kickoff_time": null, "stats": []
        }"#;
        let f: Fixture = serde_json::from_str(json).unwrap();
        assert_eq!(f.event, None);
        assert_eq!(f.kickoff_time, None);
    }

    #[test]
    fn deserializes_kickoff_time() {
        let json = r#"{
            "id": 1, "event": 1, "team_h": 1, "team_a": 2,
            "team_h_difficulty": 2, "team_a_difficulty": 3,
            "finished": true, "kickoff_time": "2024-08-16T19:00:00Z"
        }"#;
        let f: Fixture = serde_json::from_str(json).unwrap();
        assert!(f.finished);
        assert_eq!(
            f.kickoff_time.map(|t| t.to_rfc3339()),
            Some("2024-08-16T19:00:00+00:00".to_string())
        );
    }

    #[test]
    fn target_gameweek_prefers_next_then_current() {
        let gw = |id, is_current, is_next| Gameweek {
            id,
            name: format!("Gameweek {id}"),
            deadline_time: None,
            finished: false,
            is_current,
            is_next,
        };
        let mut boot = Bootstrap {
            gameweeks: vec![gw(1, true, false), gw(2, false, true)],
            ..Default::default()
        };
        assert_eq!(boot.target_gameweek(), 2);

        boot.gameweeks = vec![gw(38, true, false)];
        assert_eq!(boot.target_gameweek(), 38);

        boot.gameweeks = vec![gw(1, false, false)];
        assert_eq!(boot.target_gameweek(), 1);
    }
}
