use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::auth::IdentityProvider;
use crate::db::DatabaseProxy;
use crate::services::ProgressionEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    engine: Arc<ProgressionEngine>,
    identity: Arc<dyn IdentityProvider>,
    db_proxy: Option<Arc<DatabaseProxy>>,
}

impl AppState {
    pub fn new(
        engine: Arc<ProgressionEngine>,
        identity: Arc<dyn IdentityProvider>,
        db_proxy: Option<Arc<DatabaseProxy>>,
    ) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            engine,
            identity,
            db_proxy,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn engine(&self) -> Arc<ProgressionEngine> {
        Arc::clone(&self.engine)
    }

    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        Arc::clone(&self.identity)
    }

    pub fn db_proxy(&self) -> Option<Arc<DatabaseProxy>> {
        self.db_proxy.clone()
    }

    pub fn store_backend(&self) -> StoreBackend {
        if self.db_proxy.is_some() {
            StoreBackend::Postgres
        } else {
            StoreBackend::Memory
        }
    }
}
