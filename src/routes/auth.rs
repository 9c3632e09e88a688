use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Extension, Router};
use serde::Serialize;

use crate::auth::AuthLearner;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/auth/register", post(register))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterDto {
    learner_id: String,
    created: bool,
}

/// Seeds checkpoint and mastery records for the verified subject. Safe to call repeatedly.
async fn register(
    State(state): State<AppState>,
    Extension(learner): Extension<AuthLearner>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.engine().initialize_learner(&learner.id).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        ok(RegisterDto {
            learner_id: learner.id,
            created,
        }),
    ))
}
