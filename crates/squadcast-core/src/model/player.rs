// Player records, positions and availability status.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::flexible_f64;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Pitch position category. Upstream encodes it as `element_type` 1..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    /// All positions in pitch order (back to front).
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Short display label.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    /// Upstream `element_type` code.
    pub fn element_type(&self) -> u8 {
        match self {
            Position::Goalkeeper => 1,
            Position::Defender => 2,
            Position::Midfielder => 3,
            Position::Forward => 4,
        }
    }

    /// Number of squad places reserved for this position in a full squad.
    pub fn squad_quota(&self) -> usize {
        match self {
            Position::Goalkeeper => 2,
            Position::Defender => 5,
            Position::Midfielder => 5,
            Position::Forward => 3,
        }
    }

    /// Whether the position is judged on defensive team strength.
    pub fn is_defensive(&self) -> bool {
        matches!(self, Position::Goalkeeper | Position::Defender)
    }
}

impl TryFrom<u8> for Position {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Position::Goalkeeper),
            2 => Ok(Position::Defender),
            3 => Ok(Position::Midfielder),
            4 => Ok(Position::Forward),
            other => Err(format!("unknown element_type {other}")),
        }
    }
}

impl From<Position> for u8 {
    fn from(pos: Position) -> Self {
        pos.element_type()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// PlayerStatus
// ---------------------------------------------------------------------------

/// Availability flag as reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlayerStatus {
    Available,
    Doubtful,
    Injured,
    Suspended,
    /// Unavailable for any other reason, including left the league and
    /// unknown codes.
    Unavailable,
}

impl PlayerStatus {
    /// Single-letter upstream code.
    pub fn code(&self) -> &'static str {
        match self {
            PlayerStatus::Available => "a",
            PlayerStatus::Doubtful => "d",
            PlayerStatus::Injured => "i",
            PlayerStatus::Suspended => "s",
            PlayerStatus::Unavailable => "u",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlayerStatus::Available => "Available",
            PlayerStatus::Doubtful => "Doubtful",
            PlayerStatus::Injured => "Injured",
            PlayerStatus::Suspended => "Suspended",
            PlayerStatus::Unavailable => "Unavailable",
        }
    }
}

impl From<String> for PlayerStatus {
    fn from(code: String) -> Self {
        match code.trim() {
            "a" => PlayerStatus::Available,
            "d" => PlayerStatus::Doubtful,
            "i" => PlayerStatus::Injured,
            "s" => PlayerStatus::Suspended,
            _ => PlayerStatus::Unavailable,
        }
    }
}

impl From<PlayerStatus> for String {
    fn from(status: PlayerStatus) -> Self {
        status.code().to_string()
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A player ("element") from the bootstrap snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    /// Stable cross-season identifier; used for photo URLs.
    #[serde(default)]
    pub code: u32,
    pub web_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub second_name: String,
    /// Team id.
    pub team: u32,
    #[serde(rename = "element_type")]
    pub position: Position,
    /// Price in tenths of a currency unit.
    #[serde(rename = "now_cost")]
    pub price: u32,
    pub status: PlayerStatus,
    /// Recent-form points average.
    #[serde(default, deserialize_with = "flexible_f64")]
    pub form: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub points_per_game: f64,
    /// Ownership percentage.
    #[serde(default, deserialize_with = "flexible_f64")]
    pub selected_by_percent: f64,
    #[serde(default)]
    pub total_points: i32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub goals_scored: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub clean_sheets: u32,
    #[serde(default)]
    pub yellow_cards: u32,
    #[serde(default)]
    pub red_cards: u32,
    #[serde(default)]
    pub bonus: u32,
    #[serde(default)]
    pub chance_of_playing_this_round: Option<u8>,
    #[serde(default)]
    pub chance_of_playing_next_round: Option<u8>,
    #[serde(default)]
    pub news: String,
}

impl Player {
    /// Whether the player can be recommended as an incoming transfer.
    pub fn is_selectable(&self) -> bool {
        matches!(
            self.status,
            PlayerStatus::Available | PlayerStatus::Doubtful
        )
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Build a plain available player with neutral statistics.
    pub fn player(id: u32, team: u32, position: Position, price: u32) -> Player {
        Player {
            id,
            code: 100_000 + id,
            web_name: format!("Player{id}"),
            first_name: String::new(),
            second_name: String::new(),
            team,
            position,
            price,
            status: PlayerStatus::Available,
            form: 0.0,
            points_per_game: 0.0,
            selected_by_percent: 0.0,
            total_points: 0,
            minutes: 0,
            goals_scored: 0,
            assists: 0,
            clean_sheets: 0,
            yellow_cards: 0,
            red_cards: 0,
            bonus: 0,
            chance_of_playing_this_round: None,
            chance_of_playing_next_round: None,
            news: String::new(),
        }
    }
}
