// The user's fifteen-player squad and its formation.

pub mod formation;
pub mod state;

pub use formation::{Formation, InvalidFormation};
pub use state::{SquadError, SquadMember, SquadState, DEFAULT_BUDGET, MAX_PER_CLUB, SQUAD_SIZE};
