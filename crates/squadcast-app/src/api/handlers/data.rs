// Upstream passthrough: bootstrap, fixtures, manager lookups, league search,
// player photos.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use squadcast_core::model::{LeagueStanding, ManagerEntry};

use super::ApiResult;
use crate::api::{ApiError, AppState};
use crate::stats::decode;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "llm_enabled": state.llm.is_enabled(),
    }))
}

pub async fn bootstrap(State(state): State<Arc<AppState>>) -> ApiResult<Value> {
    Ok(Json(state.stats.bootstrap_raw().await?))
}

pub async fn fixtures(State(state): State<Arc<AppState>>) -> ApiResult<Value> {
    Ok(Json(state.stats.fixtures_raw().await?))
}

#[derive(Debug, Deserialize)]
pub struct GameweekParams {
    pub gameweek: Option<u32>,
}

/// Manager profile plus their picks for `?gameweek=` or, by default, the
/// manager's current gameweek.
pub async fn team(
    State(state): State<Arc<AppState>>,
    Path(manager_id): Path<u64>,
    Query(params): Query<GameweekParams>,
) -> ApiResult<Value> {
    let entry_raw = state.stats.entry_raw(manager_id).await?;
    let entry: ManagerEntry = decode("manager entry", entry_raw.clone())?;

    let gameweek = params.gameweek.or(entry.current_event).ok_or_else(|| {
        ApiError::NotFound(format!("manager {manager_id} has no current gameweek"))
    })?;
    let picks = state.stats.picks_raw(manager_id, gameweek).await?;

    Ok(Json(json!({
        "entry": entry_raw,
        "gameweek": gameweek,
        "picks": picks,
    })))
}

#[derive(Debug, Deserialize)]
pub struct LeagueSearchParams {
    #[serde(default)]
    pub name: String,
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LeagueSearchResponse {
    pub league_id: u64,
    pub page: u32,
    pub has_next: bool,
    pub results: Vec<LeagueStanding>,
}

pub async fn league_search(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<u64>,
    Query(params): Query<LeagueSearchParams>,
) -> ApiResult<LeagueSearchResponse> {
    let page = params.page.unwrap_or(1).max(1);
    let standings = state.stats.league_standings(league_id, page).await?;

    Ok(Json(LeagueSearchResponse {
        league_id,
        page: standings.page,
        has_next: standings.has_next,
        results: standings.search(&params.name),
    }))
}

pub async fn photo(
    State(state): State<Arc<AppState>>,
    Path(code): Path<u32>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.stats.photo(code).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}
