// Rule-based scoring: per-player predictions, rankings built on them,
// lineup selection and transfer suggestions. Everything here is pure.

pub mod lineup;
pub mod prediction;
pub mod rankings;
pub mod transfers;

pub use lineup::{pick_lineup, Lineup, LineupSlot};
pub use prediction::{predict, Confidence, Prediction, SubScores};
pub use rankings::{
    next_fixture, predict_horizon, predict_next_round, rank_captains, rank_differentials,
    team_total, upcoming_fixtures, DifferentialPick,
};
pub use transfers::{suggest_transfers, FixtureSignal, TransferMetrics, TransferSuggestion};
