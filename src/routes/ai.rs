use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::AuthLearner;
use crate::models::JudgeVerdict;
use crate::response::{ok, AppError, SuccessResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai/judge", post(judge))
        .route("/ai/chat", post(chat))
        .route("/ai/complexity", post(complexity))
}

#[derive(Debug, Deserialize)]
struct JudgeRequest {
    topic_key: String,
    problem_id: String,
    code: String,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    topic_key: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ComplexityRequest {
    code: String,
}

#[derive(Serialize)]
struct ChatDto {
    response: String,
}

#[derive(Serialize)]
struct ComplexityDto {
    analysis: String,
}

async fn judge(
    State(state): State<AppState>,
    Extension(learner): Extension<AuthLearner>,
    payload: Result<Json<JudgeRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse<JudgeVerdict>>, AppError> {
    let Json(req) = payload?;
    let verdict = state
        .engine()
        .judge_problem(&learner.id, &req.topic_key, &req.problem_id, &req.code)
        .await?;
    Ok(ok(verdict))
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse<ChatDto>>, AppError> {
    let Json(req) = payload?;
    let response = state.engine().chat(&req.topic_key, &req.message).await?;
    Ok(ok(ChatDto { response }))
}

async fn complexity(
    State(state): State<AppState>,
    payload: Result<Json<ComplexityRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse<ComplexityDto>>, AppError> {
    let Json(req) = payload?;
    let analysis = state.engine().analyze_complexity(&req.code).await?;
    Ok(ok(ComplexityDto { analysis }))
}
