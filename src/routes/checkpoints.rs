use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::AuthLearner;
use crate::models::{CheckpointStatuses, JudgeResponse};
use crate::response::{ok, AppError, SuccessResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkpoints", get(list_checkpoints))
        .route("/checkpoints/attempt", post(attempt_checkpoint))
}

#[derive(Serialize)]
struct CheckpointsDto {
    checkpoints: CheckpointStatuses,
}

#[derive(Debug, Deserialize)]
struct AttemptRequest {
    tier_number: u8,
    code: String,
}

async fn list_checkpoints(
    State(state): State<AppState>,
    Extension(learner): Extension<AuthLearner>,
) -> Result<Json<SuccessResponse<CheckpointsDto>>, AppError> {
    let checkpoints = state.engine().get_checkpoint_statuses(&learner.id).await?;
    Ok(ok(CheckpointsDto { checkpoints }))
}

async fn attempt_checkpoint(
    State(state): State<AppState>,
    Extension(learner): Extension<AuthLearner>,
    payload: Result<Json<AttemptRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse<JudgeResponse>>, AppError> {
    let Json(req) = payload?;
    let response = state
        .engine()
        .attempt_checkpoint(&learner.id, req.tier_number, &req.code)
        .await?;
    Ok(ok(response))
}
