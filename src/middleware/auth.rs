use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use crate::auth::AuthError;
use crate::response::AppError;
use crate::state::AppState;

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = crate::auth::extract_token(req.headers()) else {
        return AppError::unauthorized("missing bearer token").into_response();
    };

    match state.identity().verify(&token).await {
        Ok(learner) => {
            req.extensions_mut().insert(learner);
            next.run(req).await
        }
        Err(AuthError::MissingSecret) => {
            error!("JWT_SECRET is not configured; rejecting authenticated request");
            AppError::unauthorized("authentication failed").into_response()
        }
        Err(err) => {
            debug!(error = %err, "bearer token rejected");
            AppError::unauthorized("authentication failed").into_response()
        }
    }
}
