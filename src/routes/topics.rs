use std::collections::BTreeMap;

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Serialize;

use crate::auth::AuthLearner;
use crate::models::TopicStatus;
use crate::response::{ok, AppError, SuccessResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/topics/status", get(topic_statuses))
}

#[derive(Serialize)]
struct TopicStatusDto {
    statuses: BTreeMap<String, TopicStatus>,
}

async fn topic_statuses(
    State(state): State<AppState>,
    Extension(learner): Extension<AuthLearner>,
) -> Result<Json<SuccessResponse<TopicStatusDto>>, AppError> {
    let statuses = state.engine().topic_statuses(&learner.id).await?;
    Ok(ok(TopicStatusDto {
        statuses: statuses.into_iter().collect(),
    }))
}
