pub mod auth;
pub mod config;
pub mod curriculum;
pub mod db;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::auth::Hs256Verifier;
use crate::config::Config;
use crate::curriculum::Curriculum;
use crate::db::{CheckpointStore, DatabaseProxy, MasteryStore, MemoryStore, PgStore};
use crate::services::{AiJudge, LLMProvider, ProgressionEngine};
use crate::state::AppState;

/// Router with the HTTP trace and CORS layers applied.
pub fn build_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Wires stores, judge and identity provider from the environment.
pub async fn create_state(config: &Config) -> AppState {
    let db_proxy = if config.database_configured {
        match DatabaseProxy::from_env().await {
            Ok(proxy) => Some(Arc::new(proxy)),
            Err(err) => {
                warn!(error = %err, "database proxy not initialized, using in-memory store");
                None
            }
        }
    } else {
        info!("DATABASE_URL not set, using in-memory store");
        None
    };

    let (mastery, checkpoints): (Arc<dyn MasteryStore>, Arc<dyn CheckpointStore>) =
        match &db_proxy {
            Some(proxy) => {
                let store = Arc::new(PgStore::new(Arc::clone(proxy)));
                (store.clone() as Arc<dyn MasteryStore>, store as Arc<dyn CheckpointStore>)
            }
            None => {
                let store = Arc::new(MemoryStore::new());
                (store.clone() as Arc<dyn MasteryStore>, store as Arc<dyn CheckpointStore>)
            }
        };

    let provider = LLMProvider::from_env();
    if provider.is_available() {
        info!(
            model = %provider.config().model,
            format = ?provider.config().format,
            "AI judge configured"
        );
    } else {
        warn!("LLM_API_KEY not set; judge calls will fail");
    }

    let engine = ProgressionEngine::new(
        mastery,
        checkpoints,
        AiJudge::new(Arc::new(provider)),
        Arc::new(Curriculum::standard()),
    );

    AppState::new(
        Arc::new(engine),
        Arc::new(Hs256Verifier::new(config.jwt_secret.clone())),
        db_proxy,
    )
}

pub async fn create_app() -> axum::Router {
    let config = Config::from_env();
    build_app(create_state(&config).await)
}
