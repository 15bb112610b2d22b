//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::security::TokenKeys;
use dashboard_core::ports::DatabaseService;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub tokens: TokenKeys,
    /// When the server started; the health check reports uptime from it.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: Arc<dyn DatabaseService>, config: Arc<Config>) -> Self {
        let tokens = TokenKeys::new(&config.jwt_secret, config.jwt_ttl);
        Self {
            db,
            config,
            tokens,
            started_at: Instant::now(),
        }
    }
}

//=========================================================================================
// Per-Request Identity
//=========================================================================================

/// The authenticated caller, inserted into request extensions by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}
