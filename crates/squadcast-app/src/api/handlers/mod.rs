// Request handlers and the squad outlook they share.

pub mod assistant;
pub mod data;
pub mod predictions;
pub mod squad;

use axum::Json;
use serde::Serialize;

use squadcast_core::model::{Bootstrap, Fixture, Player, Position, TeamTable};
use squadcast_core::scoring::{predict_next_round, Prediction};
use squadcast_core::squad::SquadState;

use super::{ApiError, AppState};

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// A prediction with the names a client needs to show it.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerPrediction {
    pub web_name: String,
    pub team_name: String,
    pub position: Position,
    pub price: u32,
    pub opponent_name: Option<String>,
    #[serde(flatten)]
    pub prediction: Prediction,
}

impl PlayerPrediction {
    pub fn new(player: &Player, prediction: Prediction, teams: &TeamTable) -> Self {
        PlayerPrediction {
            web_name: player.web_name.clone(),
            team_name: teams.short_name(player.team).to_string(),
            position: player.position,
            price: player.price,
            opponent_name: prediction
                .opponent
                .map(|id| teams.short_name(id).to_string()),
            prediction,
        }
    }
}

/// Bootstrap records for the squad's members, in squad order. Members the
/// snapshot no longer lists are skipped.
pub(crate) fn squad_players(squad: &SquadState, bootstrap: &Bootstrap) -> Vec<Player> {
    squad
        .players
        .iter()
        .filter_map(|m| bootstrap.player(m.id).cloned())
        .collect()
}

/// The current squad with next-fixture predictions for every member.
pub(crate) struct SquadOutlook {
    pub squad: SquadState,
    pub bootstrap: Bootstrap,
    pub fixtures: Vec<Fixture>,
    pub teams: TeamTable,
    pub gameweek: u32,
    pub players: Vec<Player>,
    pub predictions: Vec<Prediction>,
}

impl SquadOutlook {
    pub async fn load(state: &AppState) -> Result<Self, ApiError> {
        let squad = state.squad.snapshot();
        let (bootstrap, fixtures) =
            tokio::join!(state.stats.bootstrap(), state.stats.fixtures());
        let (bootstrap, fixtures) = (bootstrap?, fixtures?);

        let teams = bootstrap.team_table();
        let gameweek = bootstrap.target_gameweek();
        let players = squad_players(&squad, &bootstrap);
        let refs: Vec<&Player> = players.iter().collect();
        let predictions = predict_next_round(&refs, &fixtures, &teams, gameweek);

        Ok(SquadOutlook {
            squad,
            bootstrap,
            fixtures,
            teams,
            gameweek,
            players,
            predictions,
        })
    }

    pub fn prediction_for(&self, player_id: u32) -> Option<&Prediction> {
        self.predictions.iter().find(|p| p.player_id == player_id)
    }

    /// Predictions paired with their players.
    pub fn named(&self, predictions: Vec<Prediction>) -> Vec<PlayerPrediction> {
        predictions
            .into_iter()
            .filter_map(|pred| {
                let player = self.players.iter().find(|p| p.id == pred.player_id)?;
                Some(PlayerPrediction::new(player, pred, &self.teams))
            })
            .collect()
    }
}
