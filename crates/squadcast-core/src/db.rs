// SQLite persistence layer for the squad.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::squad::SquadState;

/// SQLite-backed persistence: a key-value `squad_state` table holding JSON
/// values, and a `squad_history` log with one row per saved squad.
pub struct Database {
    conn: Mutex<Connection>,
}

/// One row of `squad_history`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadSnapshot {
    pub saved_at: DateTime<Utc>,
    pub manager_id: Option<u64>,
    pub player_count: usize,
    pub bank: u32,
    pub value: u32,
}

impl Database {
    /// Key under which the current squad is stored.
    const SQUAD_KEY: &'static str = "squad";

    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS squad_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS squad_history (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                saved_at     TEXT NOT NULL,
                manager_id   INTEGER,
                player_count INTEGER NOT NULL,
                bank         INTEGER NOT NULL,
                value        INTEGER NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Key-value state
    // ------------------------------------------------------------------

    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO squad_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM squad_state WHERE key = ?1")
            .context("failed to prepare load_state query")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query squad state")?;

        match rows.next() {
            Some(row_result) => {
                let json_str = row_result.context("failed to read state row")?;
                let value = serde_json::from_str(&json_str)
                    .context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Squad
    // ------------------------------------------------------------------

    /// Store `squad` as the current squad and append a history row, in one
    /// transaction.
    pub fn save_squad(&self, squad: &SquadState) -> Result<()> {
        let json_str = serde_json::to_string(squad).context("failed to serialize squad")?;
        let saved_at = Utc::now().to_rfc3339();

        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute(
            "INSERT OR REPLACE INTO squad_state (key, value) VALUES (?1, ?2)",
            params![Self::SQUAD_KEY, json_str],
        )
        .context("failed to save squad")?;
        tx.execute(
            "INSERT INTO squad_history (saved_at, manager_id, player_count, bank, value)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                saved_at,
                squad.manager_id.map(|id| id as i64),
                squad.players.len() as i64,
                squad.bank,
                squad.value(),
            ],
        )
        .context("failed to record squad history")?;
        tx.commit().context("failed to commit save_squad")?;
        Ok(())
    }

    /// The last saved squad, if any.
    pub fn load_squad(&self) -> Result<Option<SquadState>> {
        match self.load_state(Self::SQUAD_KEY)? {
            Some(value) => {
                let squad = serde_json::from_value(value).context("failed to decode saved squad")?;
                Ok(Some(squad))
            }
            None => Ok(None),
        }
    }

    /// Most recent history rows first, at most `limit`.
    pub fn squad_history(&self, limit: usize) -> Result<Vec<SquadSnapshot>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT saved_at, manager_id, player_count, bank, value
                 FROM squad_history ORDER BY id DESC LIMIT ?1",
            )
            .context("failed to prepare squad_history query")?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, u32>(3)?,
                    row.get::<_, u32>(4)?,
                ))
            })
            .context("failed to query squad history")?;

        let mut out = Vec::new();
        for row in rows {
            let (saved_at, manager_id, player_count, bank, value) =
                row.context("failed to read squad history row")?;
            let saved_at = DateTime::parse_from_rfc3339(&saved_at)
                .with_context(|| format!("bad timestamp in squad history: {saved_at}"))?
                .with_timezone(&Utc);
            out.push(SquadSnapshot {
                saved_at,
                manager_id: manager_id.map(|id| id as u64),
                player_count: player_count as usize,
                bank,
                value,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::player::test_support::player;
    use crate::model::Position;
    use serde_json::json;

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn sample_squad() -> SquadState {
        let mut squad = SquadState::new(1000);
        squad.add(&player(1, 1, Position::Goalkeeper, 45), "A").unwrap();
        squad.add(&player(2, 2, Position::Midfielder, 130), "B").unwrap();
        squad.set_captain(2).unwrap();
        squad.set_formation("3-5-2").unwrap();
        squad
    }

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"squad_state".to_string()));
        assert!(tables.contains(&"squad_history".to_string()));
    }

    #[test]
    fn save_and_load_state_round_trip() {
        let db = test_db();
        let value = json!({"gameweek": 3, "chips": ["wildcard"]});
        db.save_state("meta", &value).unwrap();
        assert_eq!(db.load_state("meta").unwrap(), Some(value));
    }

    #[test]
    fn load_state_returns_none_for_missing_key() {
        let db = test_db();
        assert!(db.load_state("nonexistent").unwrap().is_none());
    }

    #[test]
    fn save_state_overwrites_previous_value() {
        let db = test_db();
        db.save_state("key", &json!(1)).unwrap();
        db.save_state("key", &json!(2)).unwrap();
        assert_eq!(db.load_state("key").unwrap(), Some(json!(2)));
    }

    #[test]
    fn squad_round_trip() {
        let db = test_db();
        assert!(db.load_squad().unwrap().is_none());

        let squad = sample_squad();
        db.save_squad(&squad).unwrap();

        let loaded = db.load_squad().unwrap().expect("squad saved");
        assert_eq!(loaded, squad);
        assert_eq!(loaded.captain, Some(2));
        assert_eq!(loaded.formation.to_string(), "3-5-2");
        assert_eq!(loaded.bank, 1000 - 45 - 130);
    }

    #[test]
    fn each_save_appends_history_newest_first() {
        let db = test_db();
        let mut squad = sample_squad();
        db.save_squad(&squad).unwrap();
        squad.remove(1).unwrap();
        db.save_squad(&squad).unwrap();

        let history = db.squad_history(10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].player_count, 1);
        assert_eq!(history[0].bank, 1000 - 130);
        assert_eq!(history[0].value, 130);
        assert_eq!(history[1].player_count, 2);
        assert!(history[0].saved_at >= history[1].saved_at);

        assert_eq!(db.squad_history(1).unwrap().len(), 1);
    }
}
