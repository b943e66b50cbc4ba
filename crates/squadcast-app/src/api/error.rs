// Handler errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use squadcast_core::squad::SquadError;
use squadcast_llm::LlmError;

use crate::stats::StatsError;

/// Message returned for any upstream statistics failure. The detail is
/// logged, not exposed.
pub const UPSTREAM_MESSAGE: &str = "failed to fetch data from the statistics API";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Upstream(#[from] StatsError),

    #[error(transparent)]
    Squad(#[from] SquadError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Squad(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Llm(LlmError::Disabled) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Llm(LlmError::Stream(_)) => StatusCode::BAD_GATEWAY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Upstream(e) => {
                warn!("Upstream failure: {e}");
                UPSTREAM_MESSAGE.to_string()
            }
            ApiError::Llm(e) => {
                warn!("LLM failure: {e}");
                e.to_string()
            }
            ApiError::Internal(e) => {
                error!("Internal error: {e:#}");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
