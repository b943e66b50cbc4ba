// Premier League clubs and their strength ratings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A club from the bootstrap snapshot.
///
/// The four strength ratings sit roughly in [800, 1400] on the upstream
/// scale; higher is stronger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: u32,
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub strength_attack_home: u32,
    #[serde(default)]
    pub strength_attack_away: u32,
    #[serde(default)]
    pub strength_defence_home: u32,
    #[serde(default)]
    pub strength_defence_away: u32,
}

impl Team {
    /// The strength rating that matters for a player of the given kind
    /// playing home or away.
    pub fn strength_for(&self, defensive: bool, is_home: bool) -> u32 {
        match (defensive, is_home) {
            (true, true) => self.strength_defence_home,
            (true, false) => self.strength_defence_away,
            (false, true) => self.strength_attack_home,
            (false, false) => self.strength_attack_away,
        }
    }
}

/// Team lookup by id, built once per bootstrap snapshot.
#[derive(Debug, Clone, Default)]
pub struct TeamTable {
    teams: HashMap<u32, Team>,
}

impl TeamTable {
    pub fn new(teams: &[Team]) -> Self {
        TeamTable {
            teams: teams.iter().map(|t| (t.id, t.clone())).collect(),
        }
    }

    pub fn get(&self, id: u32) -> Option<&Team> {
        self.teams.get(&id)
    }

    /// Short name for display, "Unknown" when the id is not in the table.
    pub fn short_name(&self, id: u32) -> &str {
        self.teams
            .get(&id)
            .map(|t| t.short_name.as_str())
            .unwrap_or("Unknown")
    }

    /// Full name for display, "Unknown" when the id is not in the table.
    pub fn name(&self, id: u32) -> &str {
        self.teams
            .get(&id)
            .map(|t| t.name.as_str())
            .unwrap_or("Unknown")
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}
