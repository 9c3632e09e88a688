use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::AuthLearner;
use crate::models::MasterySnapshot;
use crate::response::{ok, AppError, SuccessResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mastery", get(get_mastery))
        .route("/mastery/:topicKey", put(update_mastery))
}

#[derive(Serialize)]
struct MasteryDto {
    mastery: MasterySnapshot,
}

#[derive(Debug, Deserialize)]
struct UpdateMasteryRequest {
    confidence: i32,
    #[serde(default)]
    solved_problems: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdatedDto {
    topic_key: String,
    confidence: i32,
}

async fn get_mastery(
    State(state): State<AppState>,
    Extension(learner): Extension<AuthLearner>,
) -> Result<Json<SuccessResponse<MasteryDto>>, AppError> {
    let mastery = state.engine().get_mastery(&learner.id).await?;
    Ok(ok(MasteryDto { mastery }))
}

async fn update_mastery(
    State(state): State<AppState>,
    Extension(learner): Extension<AuthLearner>,
    Path(topic_key): Path<String>,
    payload: Result<Json<UpdateMasteryRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse<UpdatedDto>>, AppError> {
    let Json(req) = payload?;
    state
        .engine()
        .update_mastery(&learner.id, &topic_key, req.confidence, req.solved_problems)
        .await?;

    Ok(ok(UpdatedDto {
        topic_key,
        confidence: req.confidence,
    }))
}
