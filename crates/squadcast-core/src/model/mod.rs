// Record shapes for the statistics API: players, teams, fixtures, gameweeks,
// manager entries and league standings.
//
// The upstream service is the source of truth for these shapes. Fields we do
// not use are ignored on deserialization; fields we do use are typed strictly
// enough that bad data fails at the boundary instead of inside the scorers.

pub mod fixture;
pub mod manager;
pub mod player;
pub mod team;

pub use fixture::{Bootstrap, Fixture, Gameweek, MatchHistory, PlayerSummary};
pub use manager::{
    EntryHistory, LeagueStanding, LeagueStandingsPage, ManagerEntry, ManagerPicks, Pick,
};
pub use player::{Player, PlayerStatus, Position};
pub use team::{Team, TeamTable};

use serde::{Deserialize, Deserializer};

/// Deserialize an `f64` that upstream may send either as a JSON number or as
/// a decimal string (`"5.2"`). Empty strings and nulls read as `0.0`.
pub(crate) fn flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
        Null(()),
    }

    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) if s.trim().is_empty() => Ok(0.0),
        NumOrStr::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid number {s:?}: {e}"))),
        NumOrStr::Null(()) => Ok(0.0),
    }
}
