// Squad store endpoints. Every successful mutation is persisted and answered
// with the new squad; refused ones answer 422 and leave the squad as it was.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use squadcast_core::db::SquadSnapshot;
use squadcast_core::squad::{Formation, SquadMember, SquadState};

use super::data::GameweekParams;
use super::ApiResult;
use crate::api::{ApiError, AppState};

const DEFAULT_HISTORY_LIMIT: usize = 20;

// ---------------------------------------------------------------------------
// Views and bodies
// ---------------------------------------------------------------------------

/// One line of the pitch, back to front.
#[derive(Debug, Serialize)]
pub struct PitchRow {
    pub position: &'static str,
    pub players: Vec<SquadMember>,
}

#[derive(Debug, Serialize)]
pub struct SquadView {
    pub manager_id: Option<u64>,
    pub players: Vec<SquadMember>,
    pub captain: Option<u32>,
    pub vice_captain: Option<u32>,
    pub formation: Formation,
    pub bank: u32,
    pub value: u32,
    pub budget: u32,
    pub is_complete: bool,
    pub pitch: Vec<PitchRow>,
    pub last_error: Option<String>,
}

impl From<&SquadState> for SquadView {
    fn from(squad: &SquadState) -> Self {
        let pitch = squad
            .by_position()
            .into_iter()
            .map(|(pos, members)| PitchRow {
                position: pos.display_str(),
                players: members.into_iter().cloned().collect(),
            })
            .collect();

        SquadView {
            manager_id: squad.manager_id,
            players: squad.players.clone(),
            captain: squad.captain,
            vice_captain: squad.vice_captain,
            formation: squad.formation,
            bank: squad.bank,
            value: squad.value(),
            budget: squad.budget(),
            is_complete: squad.is_complete(),
            pitch,
            last_error: squad.last_error.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlayerIdBody {
    pub player_id: u32,
}

#[derive(Debug, Deserialize)]
pub struct FormationBody {
    pub formation: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn get_squad(State(state): State<Arc<AppState>>) -> Json<SquadView> {
    Json(SquadView::from(&state.squad.snapshot()))
}

pub async fn add_player(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PlayerIdBody>,
) -> ApiResult<SquadView> {
    let bootstrap = state.stats.bootstrap().await?;
    let player = bootstrap
        .player(body.player_id)
        .ok_or_else(|| ApiError::NotFound(format!("player {} not found", body.player_id)))?;
    let club = bootstrap.team_table().name(player.team).to_string();

    let view = state.squad.apply(|s| {
        s.add(player, &club)?;
        Ok(SquadView::from(&*s))
    })?;
    Ok(Json(view))
}

pub async fn remove_player(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<u32>,
) -> ApiResult<SquadView> {
    let view = state.squad.apply(|s| {
        s.remove(player_id)?;
        Ok(SquadView::from(&*s))
    })?;
    Ok(Json(view))
}

pub async fn set_captain(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PlayerIdBody>,
) -> ApiResult<SquadView> {
    let view = state.squad.apply(|s| {
        s.set_captain(body.player_id)?;
        Ok(SquadView::from(&*s))
    })?;
    Ok(Json(view))
}

pub async fn set_vice_captain(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PlayerIdBody>,
) -> ApiResult<SquadView> {
    let view = state.squad.apply(|s| {
        s.set_vice_captain(body.player_id)?;
        Ok(SquadView::from(&*s))
    })?;
    Ok(Json(view))
}

pub async fn set_formation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FormationBody>,
) -> ApiResult<SquadView> {
    let view = state.squad.apply(|s| {
        s.set_formation(&body.formation)?;
        Ok(SquadView::from(&*s))
    })?;
    Ok(Json(view))
}

pub async fn reset(State(state): State<Arc<AppState>>) -> ApiResult<SquadView> {
    let view = state.squad.apply(|s| {
        s.reset();
        Ok(SquadView::from(&*s))
    })?;
    Ok(Json(view))
}

#[derive(Debug, Serialize)]
pub struct LoadedSquad {
    pub manager_id: u64,
    pub manager_name: String,
    pub team_name: String,
    pub gameweek: u32,
    /// Picks that did not match a known player.
    pub skipped: usize,
    pub squad: SquadView,
}

/// Replace the squad with a manager's picks for `?gameweek=`, defaulting to
/// their current gameweek.
pub async fn load_from_manager(
    State(state): State<Arc<AppState>>,
    Path(manager_id): Path<u64>,
    Query(params): Query<GameweekParams>,
) -> ApiResult<LoadedSquad> {
    let (bootstrap, entry) =
        tokio::join!(state.stats.bootstrap(), state.stats.entry(manager_id));
    let (bootstrap, entry) = (bootstrap?, entry?);

    let gameweek = params
        .gameweek
        .or(entry.current_event)
        .or_else(|| bootstrap.current_gameweek().map(|g| g.id))
        .ok_or_else(|| {
            ApiError::NotFound(format!("manager {manager_id} has no current gameweek"))
        })?;
    let picks = state.stats.picks(manager_id, gameweek).await?;

    let (skipped, squad) = state.squad.apply(|s| {
        let skipped = s.load_from_picks(manager_id, &picks, &bootstrap);
        Ok((skipped, SquadView::from(&*s)))
    })?;

    Ok(Json(LoadedSquad {
        manager_id,
        manager_name: entry.manager_name(),
        team_name: entry.name,
        gameweek,
        skipped,
        squad,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Vec<SquadSnapshot>> {
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(Json(state.squad.history(limit)?))
}
