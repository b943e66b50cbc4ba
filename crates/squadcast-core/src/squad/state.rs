// Squad state: roster, bank, captaincy, formation and the rules that guard
// every mutation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::formation::{Formation, InvalidFormation};
use crate::model::{Bootstrap, ManagerPicks, Player, Position};

/// Players in a complete squad.
pub const SQUAD_SIZE: usize = 15;

/// Most players a squad may hold from one club.
pub const MAX_PER_CLUB: usize = 3;

/// Starting bank of an empty squad, tenths of a unit.
pub const DEFAULT_BUDGET: u32 = 1000;

/// Picks in slots 1..=STARTING_SLOTS start; the rest are on the bench.
const STARTING_SLOTS: u8 = 11;

fn money(tenths: &u32) -> String {
    format!("{:.1}", *tenths as f64 / 10.0)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A refused squad mutation. The display string is shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SquadError {
    #[error("squad is full ({} players)", SQUAD_SIZE)]
    SquadFull,

    #[error("{name} is already in the squad")]
    AlreadyInSquad { name: String },

    #[error("squad already has {quota} {position} players")]
    PositionFull { position: Position, quota: usize },

    #[error("squad already has {} players from {club}", MAX_PER_CLUB)]
    ClubLimit { club: String },

    #[error("{name} costs {} but only {} is in the bank", money(.price), money(.bank))]
    InsufficientFunds { name: String, price: u32, bank: u32 },

    #[error("player {id} is not in the squad")]
    NotInSquad { id: u32 },

    #[error("{name} is the captain and cannot also be vice-captain")]
    CaptainAsVice { name: String },

    #[error(transparent)]
    Formation(#[from] InvalidFormation),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The parts of a player the squad needs to validate itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadMember {
    pub id: u32,
    pub web_name: String,
    /// Team id.
    pub team: u32,
    pub position: Position,
    /// Price paid, tenths of a unit.
    pub price: u32,
}

impl From<&Player> for SquadMember {
    fn from(p: &Player) -> Self {
        SquadMember {
            id: p.id,
            web_name: p.web_name.clone(),
            team: p.team,
            position: p.position,
            price: p.price,
        }
    }
}

fn default_budget() -> u32 {
    DEFAULT_BUDGET
}

/// The user's squad. Serialised as is for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadState {
    /// Set when the squad was loaded from a manager's picks.
    #[serde(default)]
    pub manager_id: Option<u64>,
    pub players: Vec<SquadMember>,
    #[serde(default)]
    pub captain: Option<u32>,
    #[serde(default)]
    pub vice_captain: Option<u32>,
    #[serde(default)]
    pub formation: Formation,
    /// Unspent money, tenths of a unit.
    pub bank: u32,
    /// Bank of an empty squad; restored on reset.
    #[serde(default = "default_budget")]
    budget: u32,
    /// Reason the last mutation was refused. Cleared by the next success.
    #[serde(skip)]
    pub last_error: Option<String>,
}

impl Default for SquadState {
    fn default() -> Self {
        SquadState::new(DEFAULT_BUDGET)
    }
}

impl SquadState {
    /// An empty squad with `budget` in the bank.
    pub fn new(budget: u32) -> Self {
        SquadState {
            manager_id: None,
            players: Vec::new(),
            captain: None,
            vice_captain: None,
            formation: Formation::default(),
            bank: budget,
            budget,
            last_error: None,
        }
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    /// Change the budget the next reset starts from. The bank is untouched.
    pub fn set_budget(&mut self, budget: u32) {
        self.budget = budget;
    }

    /// Sum of member prices.
    pub fn value(&self) -> u32 {
        self.players.iter().map(|p| p.price).sum()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    pub fn member(&self, id: u32) -> Option<&SquadMember> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_ids(&self) -> Vec<u32> {
        self.players.iter().map(|p| p.id).collect()
    }

    pub fn count_position(&self, pos: Position) -> usize {
        self.players.iter().filter(|p| p.position == pos).count()
    }

    pub fn count_club(&self, team: u32) -> usize {
        self.players.iter().filter(|p| p.team == team).count()
    }

    pub fn is_complete(&self) -> bool {
        self.players.len() == SQUAD_SIZE
    }

    /// Members grouped by position, back to front.
    pub fn by_position(&self) -> Vec<(Position, Vec<&SquadMember>)> {
        Position::ALL
            .iter()
            .map(|&pos| {
                let members = self.players.iter().filter(|p| p.position == pos).collect();
                (pos, members)
            })
            .collect()
    }

    /// Record the outcome of a mutation in `last_error`.
    fn record<T>(&mut self, result: Result<T, SquadError>) -> Result<T, SquadError> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => self.last_error = Some(e.to_string()),
        }
        result
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    fn validate_add(&self, player: &Player, club_name: &str) -> Result<(), SquadError> {
        if self.players.len() >= SQUAD_SIZE {
            return Err(SquadError::SquadFull);
        }
        if self.contains(player.id) {
            return Err(SquadError::AlreadyInSquad {
                name: player.web_name.clone(),
            });
        }
        let quota = player.position.squad_quota();
        if self.count_position(player.position) >= quota {
            return Err(SquadError::PositionFull {
                position: player.position,
                quota,
            });
        }
        if self.count_club(player.team) >= MAX_PER_CLUB {
            return Err(SquadError::ClubLimit {
                club: club_name.to_string(),
            });
        }
        if player.price > self.bank {
            return Err(SquadError::InsufficientFunds {
                name: player.web_name.clone(),
                price: player.price,
                bank: self.bank,
            });
        }
        Ok(())
    }

    /// Add a player, paying for them from the bank.
    ///
    /// `club_name` is only used in the club-limit message.
    pub fn add(&mut self, player: &Player, club_name: &str) -> Result<(), SquadError> {
        let result = self.validate_add(player, club_name).map(|()| {
            self.bank -= player.price;
            self.players.push(SquadMember::from(player));
        });
        self.record(result)
    }

    /// Remove a member, refunding their price. Clears any armband they held.
    pub fn remove(&mut self, id: u32) -> Result<SquadMember, SquadError> {
        let result = match self.players.iter().position(|p| p.id == id) {
            Some(idx) => {
                let member = self.players.remove(idx);
                self.bank += member.price;
                if self.captain == Some(id) {
                    self.captain = None;
                }
                if self.vice_captain == Some(id) {
                    self.vice_captain = None;
                }
                Ok(member)
            }
            None => Err(SquadError::NotInSquad { id }),
        };
        self.record(result)
    }

    /// Hand the armband to a member. A vice-captain promoted to captain
    /// loses the vice role.
    pub fn set_captain(&mut self, id: u32) -> Result<(), SquadError> {
        let result = if self.contains(id) {
            if self.vice_captain == Some(id) {
                self.vice_captain = None;
            }
            self.captain = Some(id);
            Ok(())
        } else {
            Err(SquadError::NotInSquad { id })
        };
        self.record(result)
    }

    pub fn set_vice_captain(&mut self, id: u32) -> Result<(), SquadError> {
        let result = if !self.contains(id) {
            Err(SquadError::NotInSquad { id })
        } else if self.captain == Some(id) {
            Err(SquadError::CaptainAsVice {
                name: self
                    .member(id)
                    .map(|m| m.web_name.clone())
                    .unwrap_or_default(),
            })
        } else {
            self.vice_captain = Some(id);
            Ok(())
        };
        self.record(result)
    }

    /// Set the formation from its dashed form ("4-4-2").
    pub fn set_formation(&mut self, formation: &str) -> Result<Formation, SquadError> {
        let result = formation
            .parse::<Formation>()
            .map_err(SquadError::from)
            .map(|f| {
                self.formation = f;
                f
            });
        self.record(result)
    }

    /// Back to an empty squad with the configured budget.
    pub fn reset(&mut self) {
        *self = SquadState::new(self.budget);
    }

    /// Replace the whole squad with a manager's gameweek picks.
    ///
    /// Picks that do not resolve to a known player are skipped. The formation
    /// is read off the starting eleven when it is a legal one. Returns the
    /// number of skipped picks.
    pub fn load_from_picks(
        &mut self,
        manager_id: u64,
        picks: &ManagerPicks,
        bootstrap: &Bootstrap,
    ) -> usize {
        let mut next = SquadState::new(self.budget);
        next.manager_id = Some(manager_id);
        next.bank = picks.entry_history.bank;

        let mut skipped = 0;
        let mut starters = [0u8; 4];
        for pick in &picks.picks {
            let Some(player) = bootstrap.player(pick.element) else {
                warn!("Skipping pick {}: player not in bootstrap", pick.element);
                skipped += 1;
                continue;
            };
            if pick.position <= STARTING_SLOTS {
                starters[player.position.element_type() as usize - 1] += 1;
            }
            next.players.push(SquadMember::from(player));
        }

        next.captain = picks.captain().filter(|id| next.contains(*id));
        next.vice_captain = picks
            .vice_captain()
            .filter(|id| next.contains(*id) && next.captain != Some(*id));

        let shape = Formation::new(starters[1], starters[2], starters[3]);
        if starters[0] == 1 && shape.is_legal() {
            next.formation = shape;
        }

        *self = next;
        skipped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
