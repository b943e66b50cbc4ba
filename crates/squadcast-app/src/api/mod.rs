// HTTP API: shared state, the squad store and the router.

pub mod error;
pub mod handlers;
pub mod routes;

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use tracing::{info, warn};

use squadcast_core::config::{Config, FixtureSignalMode};
use squadcast_core::db::{Database, SquadSnapshot};
use squadcast_core::squad::{SquadError, SquadState};
use squadcast_llm::LlmClient;

use crate::stats::StatsSource;

pub use error::ApiError;
pub use routes::create_router;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// The slice of configuration the handlers read.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub llm_max_tokens: u32,
    pub chat_max_tokens: u32,
    /// Default number of fixtures for multi-gameweek predictions.
    pub horizon: usize,
    /// Default ownership ceiling for differentials, percent.
    pub differential_max_ownership: f64,
    pub fixture_signal: FixtureSignalMode,
}

impl From<&Config> for ApiSettings {
    fn from(config: &Config) -> Self {
        ApiSettings {
            llm_max_tokens: config.llm.max_tokens,
            chat_max_tokens: config.llm.chat_max_tokens,
            horizon: config.predictions.horizon,
            differential_max_ownership: config.predictions.differential_max_ownership,
            fixture_signal: config.transfers.fixture_signal,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            llm_max_tokens: 1024,
            chat_max_tokens: 600,
            horizon: 5,
            differential_max_ownership: 10.0,
            fixture_signal: FixtureSignalMode::Constant,
        }
    }
}

// ---------------------------------------------------------------------------
// SquadStore
// ---------------------------------------------------------------------------

const PERSIST_FAILED: &str = "failed to persist squad";

/// The single user's squad, persisted after every successful mutation.
pub struct SquadStore {
    state: Mutex<SquadState>,
    db: Database,
}

impl SquadStore {
    pub fn new(state: SquadState, db: Database) -> Self {
        SquadStore {
            state: Mutex::new(state),
            db,
        }
    }

    /// Resume the last saved squad, or start an empty one with `budget`.
    ///
    /// A restored squad keeps its bank, but `budget` replaces the saved one
    /// so a reset starts from the configured amount.
    pub fn restore(db: Database, budget: u32) -> anyhow::Result<Self> {
        let state = match db.load_squad().context("failed to restore squad")? {
            Some(mut saved) => {
                info!(
                    "Restored squad with {} players (manager {:?})",
                    saved.players.len(),
                    saved.manager_id
                );
                if saved.budget() != budget {
                    info!("Budget changed from {} to {budget}", saved.budget());
                    saved.set_budget(budget);
                }
                saved
            }
            None => {
                info!("No saved squad, starting empty");
                SquadState::new(budget)
            }
        };
        Ok(SquadStore::new(state, db))
    }

    fn lock(&self) -> MutexGuard<'_, SquadState> {
        self.state.lock().expect("squad mutex poisoned")
    }

    pub fn snapshot(&self) -> SquadState {
        self.lock().clone()
    }

    /// Run a mutation on a copy of the squad and install it once saved.
    ///
    /// A rejected mutation only sets `last_error`. A failed save leaves the
    /// squad as it was, apart from `last_error`.
    pub fn apply<T>(
        &self,
        mutation: impl FnOnce(&mut SquadState) -> Result<T, SquadError>,
    ) -> Result<T, ApiError> {
        let mut state = self.lock();
        let mut next = state.clone();
        let out = match mutation(&mut next) {
            Ok(out) => out,
            Err(e) => {
                state.last_error = next.last_error;
                return Err(e.into());
            }
        };
        if let Err(e) = self.db.save_squad(&next) {
            warn!("Squad change not applied: {e:#}");
            state.last_error = Some(PERSIST_FAILED.to_string());
            return Err(e.context(PERSIST_FAILED).into());
        }
        *state = next;
        Ok(out)
    }

    pub fn history(&self, limit: usize) -> anyhow::Result<Vec<SquadSnapshot>> {
        self.db.squad_history(limit)
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub stats: Arc<dyn StatsSource>,
    pub squad: SquadStore,
    pub llm: LlmClient,
    pub settings: ApiSettings,
}

impl AppState {
    pub fn new(
        stats: Arc<dyn StatsSource>,
        squad: SquadStore,
        llm: LlmClient,
        settings: ApiSettings,
    ) -> Self {
        AppState {
            stats,
            squad,
            llm,
            settings,
        }
    }
}
