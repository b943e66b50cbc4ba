// Manager ("entry") lookups: profile, gameweek picks, league standings.

use serde::{Deserialize, Serialize};

/// `entry/{id}/`: a manager's public profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerEntry {
    pub id: u64,
    /// Team name chosen by the manager.
    pub name: String,
    #[serde(default)]
    pub player_first_name: String,
    #[serde(default)]
    pub player_last_name: String,
    #[serde(default)]
    pub current_event: Option<u32>,
    #[serde(default)]
    pub summary_overall_points: Option<i64>,
    #[serde(default)]
    pub summary_overall_rank: Option<u64>,
}

impl ManagerEntry {
    pub fn manager_name(&self) -> String {
        format!("{} {}", self.player_first_name, self.player_last_name)
            .trim()
            .to_string()
    }
}

/// One slot in a manager's gameweek selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    /// Player id.
    pub element: u32,
    /// Slot 1..=15; 1-11 start, 12-15 bench.
    pub position: u8,
    #[serde(default)]
    pub multiplier: u8,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub is_vice_captain: bool,
}

/// Money and score totals attached to a picks response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryHistory {
    #[serde(default)]
    pub event: u32,
    /// Unspent budget, tenths of a unit.
    #[serde(default)]
    pub bank: u32,
    /// Squad value, tenths of a unit.
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub total_points: i32,
}

/// `entry/{id}/event/{gw}/picks/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerPicks {
    pub picks: Vec<Pick>,
    #[serde(default)]
    pub entry_history: EntryHistory,
}

impl ManagerPicks {
    pub fn captain(&self) -> Option<u32> {
        self.picks.iter().find(|p| p.is_captain).map(|p| p.element)
    }

    pub fn vice_captain(&self) -> Option<u32> {
        self.picks
            .iter()
            .find(|p| p.is_vice_captain)
            .map(|p| p.element)
    }
}

/// One row of a classic league table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueStanding {
    /// Manager id.
    pub entry: u64,
    pub entry_name: String,
    pub player_name: String,
    pub rank: u32,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StandingsSection {
    has_next: bool,
    page: u32,
    results: Vec<LeagueStanding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LeagueStandingsRaw {
    standings: StandingsSection,
}

/// One page of `leagues-classic/{id}/standings/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LeagueStandingsRaw")]
pub struct LeagueStandingsPage {
    pub has_next: bool,
    pub page: u32,
    pub results: Vec<LeagueStanding>,
}

impl From<LeagueStandingsRaw> for LeagueStandingsPage {
    fn from(raw: LeagueStandingsRaw) -> Self {
        LeagueStandingsPage {
            has_next: raw.standings.has_next,
            page: raw.standings.page,
            results: raw.standings.results,
        }
    }
}

impl LeagueStandingsPage {
    /// Case-insensitive substring match on team name or manager name.
    pub fn search(&self, query: &str) -> Vec<LeagueStanding> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.results.clone();
        }
        self.results
            .iter()
            .filter(|r| {
                r.entry_name.to_lowercase().contains(&needle)
                    || r.player_name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STANDINGS_JSON: &str = r#"{
        "league": { "id": 314, "name": "Overall" },
        "standings": {
            "has_next": true,
            "page": 2,
            "results": [
                { "entry": 11, "entry_name": "Klopp's Kids", "player_name": "Ann Lee", "rank": 51, "total": 1402 },
                { "entry": 12, "entry_name": "Salah Dayz", "player_name": "Bo Chen", "rank": 52, "total": 1399 },
                { "entry": 13, "entry_name": "No Kane No Gain", "player_name": "Cy Klopper", "rank": 53, "total": 1391 }
            ]
        }
    }"#;

    #[test]
    fn standings_page_flattens_upstream_shape() {
        let page: LeagueStandingsPage = serde_json::from_str(STANDINGS_JSON).unwrap();
        assert!(page.has_next);
        assert_eq!(page.page, 2);
        assert_eq!(page.results.len(), 3);
    }

    #[test]
    fn search_matches_team_or_manager_case_insensitively() {
        let page: LeagueStandingsPage = serde_json::from_str(STANDINGS_JSON).unwrap();
        let hits = page.search("KLOPP");
        let ids: Vec<u64> = hits.iter().map(|r| r.entry).collect();
        assert_eq!(ids, vec![11, 13]);
        assert_eq!(page.search("  ").len(), 3);
        assert!(page.search("arteta").is_empty());
    }

    #[test]
    fn picks_expose_captaincy() {
        let json = r#"{
            "picks": [
                { "element": 5, "position": 1, "multiplier": 1, "is_captain": false, "is_vice_captain": true },
                { "element": 9, "position": 2, "multiplier": 2, "is_captain": true, "is_vice_captain": false }
            ],
            "entry_history": { "event": 4, "bank": 15, "value": 1012, "points": 60, "total_points": 240 }
        }"#;
        let picks: ManagerPicks = serde_json::from_str(json).unwrap();
        assert_eq!(picks.captain(), Some(9));
        assert_eq!(picks.vice_captain(), Some(5));
        assert_eq!(picks.entry_history.bank, 15);
    }

    #[test]
    fn manager_name_joins_parts() {
        let entry = ManagerEntry {
            id: 1,
            name: "FC Test".into(),
            player_first_name: "Ann".into(),
            player_last_name: "Lee".into(),
            current_event: Some(3),
            summary_overall_points: None,
            summary_overall_rank: None,
        };
        assert_eq!(entry.manager_name(), "Ann Lee");
    }
}
