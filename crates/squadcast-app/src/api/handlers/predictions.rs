// Rule-based prediction and transfer endpoints. No LLM involved.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use squadcast_core::model::Player;
use squadcast_core::scoring::{
    pick_lineup, predict_horizon, predict_next_round, rank_captains, rank_differentials,
    suggest_transfers, team_total, DifferentialPick, Lineup, TransferSuggestion,
};
use squadcast_core::squad::Formation;

use super::{ApiResult, PlayerPrediction, SquadOutlook};
use crate::api::{ApiError, AppState};

/// Longest lookahead a client may ask for.
const MAX_HORIZON: usize = 10;
const DEFAULT_DIFFERENTIAL_LIMIT: usize = 20;

// ---------------------------------------------------------------------------
// Single player
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HorizonParams {
    pub horizon: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PlayerOutlook {
    pub player_id: u32,
    pub web_name: String,
    pub from_gameweek: u32,
    /// One entry per upcoming fixture; empty over a blank run.
    pub predictions: Vec<PlayerPrediction>,
    pub total: u32,
}

pub async fn player(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<u32>,
    Query(params): Query<HorizonParams>,
) -> ApiResult<PlayerOutlook> {
    let horizon = params
        .horizon
        .unwrap_or(state.settings.horizon)
        .clamp(1, MAX_HORIZON);

    let (bootstrap, fixtures, summary) = tokio::join!(
        state.stats.bootstrap(),
        state.stats.fixtures(),
        state.stats.player_summary(player_id),
    );
    let bootstrap = bootstrap?;
    let player = bootstrap
        .player(player_id)
        .ok_or_else(|| ApiError::NotFound(format!("player {player_id} not found")))?;
    let (fixtures, summary) = (fixtures?, summary?);

    let teams = bootstrap.team_table();
    let from_gameweek = bootstrap.target_gameweek();
    let predictions: Vec<PlayerPrediction> = predict_horizon(
        player,
        &fixtures,
        &teams,
        Some(summary.history.as_slice()),
        from_gameweek,
        horizon,
    )
    .into_iter()
    .map(|pred| PlayerPrediction::new(player, pred, &teams))
    .collect();
    let total = predictions
        .iter()
        .map(|p| p.prediction.predicted_points)
        .sum();

    Ok(Json(PlayerOutlook {
        player_id,
        web_name: player.web_name.clone(),
        from_gameweek,
        predictions,
        total,
    }))
}

// ---------------------------------------------------------------------------
// Squad views
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CaptainRanking {
    pub gameweek: u32,
    /// Best first.
    pub captains: Vec<PlayerPrediction>,
}

pub async fn captains(State(state): State<Arc<AppState>>) -> ApiResult<CaptainRanking> {
    let outlook = SquadOutlook::load(&state).await?;
    let ranked = rank_captains(outlook.predictions.clone());
    Ok(Json(CaptainRanking {
        gameweek: outlook.gameweek,
        captains: outlook.named(ranked),
    }))
}

#[derive(Debug, Serialize)]
pub struct TeamPrediction {
    pub gameweek: u32,
    pub formation: Formation,
    pub captain: Option<u32>,
    /// Every member's prediction, captain doubled.
    pub squad_total: u32,
    pub lineup: Lineup,
    pub players: Vec<PlayerPrediction>,
}

pub async fn team(State(state): State<Arc<AppState>>) -> ApiResult<TeamPrediction> {
    let outlook = SquadOutlook::load(&state).await?;
    let squad = &outlook.squad;

    let lineup = pick_lineup(
        &squad.players,
        squad.formation,
        &outlook.predictions,
        squad.captain,
    );
    let squad_total = team_total(&outlook.predictions, squad.captain);

    Ok(Json(TeamPrediction {
        gameweek: outlook.gameweek,
        formation: squad.formation,
        captain: squad.captain,
        squad_total,
        lineup,
        players: outlook.named(outlook.predictions.clone()),
    }))
}

// ---------------------------------------------------------------------------
// Differentials
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DifferentialParams {
    pub max_ownership: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct NamedDifferential {
    pub web_name: String,
    pub team_name: String,
    #[serde(flatten)]
    pub pick: DifferentialPick,
}

#[derive(Debug, Serialize)]
pub struct DifferentialRanking {
    pub gameweek: u32,
    pub max_ownership: f64,
    pub picks: Vec<NamedDifferential>,
}

pub async fn differentials(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DifferentialParams>,
) -> ApiResult<DifferentialRanking> {
    let max_ownership = params
        .max_ownership
        .unwrap_or(state.settings.differential_max_ownership);
    if !(0.0..=100.0).contains(&max_ownership) {
        return Err(ApiError::BadRequest(format!(
            "max_ownership must be between 0 and 100, got {max_ownership}"
        )));
    }
    let limit = params.limit.unwrap_or(DEFAULT_DIFFERENTIAL_LIMIT);

    let (bootstrap, fixtures) = tokio::join!(state.stats.bootstrap(), state.stats.fixtures());
    let (bootstrap, fixtures) = (bootstrap?, fixtures?);

    let teams = bootstrap.team_table();
    let gameweek = bootstrap.target_gameweek();
    let pool: Vec<&Player> = bootstrap
        .players
        .iter()
        .filter(|p| p.is_selectable())
        .collect();
    let predictions = predict_next_round(&pool, &fixtures, &teams, gameweek);

    let mut ranked = rank_differentials(&bootstrap.players, &predictions, max_ownership);
    ranked.truncate(limit);

    let picks = ranked
        .into_iter()
        .filter_map(|pick| {
            let player = bootstrap.player(pick.player_id)?;
            Some(NamedDifferential {
                web_name: player.web_name.clone(),
                team_name: teams.short_name(player.team).to_string(),
                pick,
            })
        })
        .collect();

    Ok(Json(DifferentialRanking {
        gameweek,
        max_ownership,
        picks,
    }))
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TransferPlan {
    pub gameweek: u32,
    pub bank: u32,
    /// Best expected gain first.
    pub suggestions: Vec<TransferSuggestion>,
}

impl TransferPlan {
    pub(crate) fn build(outlook: &SquadOutlook, state: &AppState) -> Self {
        let signal = state
            .settings
            .fixture_signal
            .signal(&outlook.fixtures, outlook.gameweek);
        let suggestions = suggest_transfers(
            &outlook.players,
            &outlook.bootstrap.players,
            outlook.squad.bank,
            &signal,
        );
        TransferPlan {
            gameweek: outlook.gameweek,
            bank: outlook.squad.bank,
            suggestions,
        }
    }
}

pub async fn transfer_plan(State(state): State<Arc<AppState>>) -> ApiResult<TransferPlan> {
    let outlook = SquadOutlook::load(&state).await?;
    Ok(Json(TransferPlan::build(&outlook, &state)))
}
