// LLM-backed endpoints. Each builds a prompt from the squad outlook and runs
// it to completion.
//
// Endpoints that also carry a heuristic result (captain ranking, lineup,
// transfer plan) still answer when the LLM is off or fails; the failure is
// reported alongside in `advice.error`. Pure-LLM endpoints fail with the
// LLM's status instead.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use squadcast_core::scoring::{pick_lineup, rank_captains, Lineup};
use squadcast_llm::prompt::{
    build_captain_prompt, build_chat_system_prompt, build_lineup_prompt,
    build_team_analysis_prompt, build_transfer_strategy_prompt, system_prompt, CaptainOption,
    SquadContext, SquadLine,
};
use squadcast_llm::{ChatMessage, Completion, Role};

use super::predictions::TransferPlan;
use super::{ApiResult, PlayerPrediction, SquadOutlook};
use crate::api::{ApiError, AppState};

/// Captaincy options shown to the model.
const CAPTAIN_OPTIONS: usize = 5;

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

/// Model output, or why there is none.
#[derive(Debug, Serialize)]
pub struct Advice {
    pub completion: Option<Completion>,
    pub error: Option<String>,
}

impl Advice {
    async fn request(state: &AppState, prompt: &str) -> Self {
        match state
            .llm
            .complete(&system_prompt(), prompt, state.settings.llm_max_tokens)
            .await
        {
            Ok(completion) => Advice {
                completion: Some(completion),
                error: None,
            },
            Err(e) => {
                warn!("Advice unavailable: {e}");
                Advice {
                    completion: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Flatten the outlook into what the prompts show.
fn squad_context(outlook: &SquadOutlook) -> SquadContext {
    let squad = &outlook.squad;
    let players = squad
        .players
        .iter()
        .map(|member| {
            let player = outlook.bootstrap.player(member.id);
            let prediction = outlook.prediction_for(member.id);
            SquadLine {
                name: member.web_name.clone(),
                club: outlook.teams.short_name(member.team).to_string(),
                position: member.position,
                price: member.price,
                form: player.map(|p| p.form).unwrap_or(0.0),
                points_per_game: player.map(|p| p.points_per_game).unwrap_or(0.0),
                total_points: player.map(|p| p.total_points).unwrap_or(0),
                status: player
                    .map(|p| p.status.label())
                    .unwrap_or("Unknown")
                    .to_string(),
                news: player.map(|p| p.news.clone()).unwrap_or_default(),
                predicted_points: prediction.map(|p| p.predicted_points),
                opponent: prediction
                    .and_then(|p| p.opponent)
                    .map(|id| outlook.teams.short_name(id).to_string()),
                is_home: prediction.and_then(|p| p.is_home),
                is_captain: squad.captain == Some(member.id),
                is_vice_captain: squad.vice_captain == Some(member.id),
            }
        })
        .collect();

    SquadContext {
        gameweek: outlook.gameweek,
        formation: squad.formation.to_string(),
        bank: squad.bank,
        value: squad.value(),
        players,
    }
}

fn require_players(outlook: &SquadOutlook) -> Result<(), ApiError> {
    if outlook.squad.players.is_empty() {
        return Err(ApiError::BadRequest(
            "squad is empty; add players or load a manager first".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Team analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TeamAnalysis {
    pub gameweek: u32,
    pub analysis: Completion,
}

pub async fn team_analysis(State(state): State<Arc<AppState>>) -> ApiResult<TeamAnalysis> {
    let outlook = SquadOutlook::load(&state).await?;
    require_players(&outlook)?;

    let prompt = build_team_analysis_prompt(&squad_context(&outlook));
    let analysis = state
        .llm
        .complete(&system_prompt(), &prompt, state.settings.llm_max_tokens)
        .await?;
    info!(
        "Team analysis complete ({} in / {} out tokens)",
        analysis.input_tokens, analysis.output_tokens
    );

    Ok(Json(TeamAnalysis {
        gameweek: outlook.gameweek,
        analysis,
    }))
}

// ---------------------------------------------------------------------------
// Captain
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CaptainAdvice {
    pub gameweek: u32,
    pub captains: Vec<PlayerPrediction>,
    pub advice: Advice,
}

pub async fn captain(State(state): State<Arc<AppState>>) -> ApiResult<CaptainAdvice> {
    let outlook = SquadOutlook::load(&state).await?;
    require_players(&outlook)?;

    let captains = outlook.named(rank_captains(outlook.predictions.clone()));
    let options: Vec<CaptainOption> = captains
        .iter()
        .take(CAPTAIN_OPTIONS)
        .map(|c| CaptainOption {
            name: c.web_name.clone(),
            predicted_points: c.prediction.predicted_points,
            confidence: c.prediction.confidence,
            opponent: c.opponent_name.clone(),
            is_home: c.prediction.is_home,
        })
        .collect();

    let prompt = build_captain_prompt(&squad_context(&outlook), &options);
    let advice = Advice::request(&state, &prompt).await;

    Ok(Json(CaptainAdvice {
        gameweek: outlook.gameweek,
        captains,
        advice,
    }))
}

// ---------------------------------------------------------------------------
// Lineup
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct LineupAdvice {
    pub gameweek: u32,
    pub lineup: Lineup,
    pub advice: Advice,
}

pub async fn lineup(State(state): State<Arc<AppState>>) -> ApiResult<LineupAdvice> {
    let outlook = SquadOutlook::load(&state).await?;
    require_players(&outlook)?;

    let squad = &outlook.squad;
    let lineup = pick_lineup(
        &squad.players,
        squad.formation,
        &outlook.predictions,
        squad.captain,
    );
    let prompt = build_lineup_prompt(&squad_context(&outlook), &lineup);
    let advice = Advice::request(&state, &prompt).await;

    Ok(Json(LineupAdvice {
        gameweek: outlook.gameweek,
        lineup,
        advice,
    }))
}

// ---------------------------------------------------------------------------
// Transfer strategy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TransferStrategy {
    pub plan: TransferPlan,
    pub advice: Advice,
}

pub async fn transfer_strategy(
    State(state): State<Arc<AppState>>,
) -> ApiResult<TransferStrategy> {
    let outlook = SquadOutlook::load(&state).await?;
    require_players(&outlook)?;

    let plan = TransferPlan::build(&outlook, &state);
    let prompt = build_transfer_strategy_prompt(&squad_context(&outlook), &plan.suggestions);
    let advice = Advice::request(&state, &prompt).await;

    Ok(Json(TransferStrategy { plan, advice }))
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Earlier turns, oldest first.
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatReply> {
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }
    if request.history.first().is_some_and(|m| m.role != Role::User) {
        return Err(ApiError::BadRequest(
            "history must start with a user turn".to_string(),
        ));
    }

    let outlook = SquadOutlook::load(&state).await?;
    let system = build_chat_system_prompt(&squad_context(&outlook));

    let mut messages = request.history;
    messages.push(ChatMessage::user(request.message));

    let completion = state
        .llm
        .converse(&system, &messages, state.settings.chat_max_tokens)
        .await?;

    Ok(Json(ChatReply {
        reply: completion.text,
        input_tokens: completion.input_tokens,
        output_tokens: completion.output_tokens,
    }))
}
