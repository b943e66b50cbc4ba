use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{assistant, data, predictions, squad};
use super::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(data::health))
        // Upstream passthrough
        .route("/api/bootstrap", get(data::bootstrap))
        .route("/api/fixtures", get(data::fixtures))
        .route("/api/team/:manager_id", get(data::team))
        .route("/api/league/:league_id/search", get(data::league_search))
        .route("/api/photo/:code", get(data::photo))
        // Heuristics
        .route("/api/predictions/captains", get(predictions::captains))
        .route("/api/predictions/differentials", get(predictions::differentials))
        .route("/api/predictions/team", get(predictions::team))
        .route("/api/predictions/:player_id", get(predictions::player))
        .route("/api/transfers/plan", post(predictions::transfer_plan))
        // Assistant
        .route("/api/ai/team-analysis", post(assistant::team_analysis))
        .route("/api/ai/captain", post(assistant::captain))
        .route("/api/ai/lineup", post(assistant::lineup))
        .route("/api/ai/transfer-strategy", post(assistant::transfer_strategy))
        .route("/api/chat", post(assistant::chat))
        // Squad
        .route("/api/squad", get(squad::get_squad))
        .route("/api/squad/history", get(squad::history))
        .route("/api/squad/players", post(squad::add_player))
        .route("/api/squad/players/:player_id", delete(squad::remove_player))
        .route("/api/squad/captain", put(squad::set_captain))
        .route("/api/squad/vice-captain", put(squad::set_vice_captain))
        .route("/api/squad/formation", put(squad::set_formation))
        .route("/api/squad/load/:manager_id", post(squad::load_from_manager))
        .route("/api/squad/reset", post(squad::reset))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
