//! # Bazario API
//!
//! REST server for the Bazario voucher platform.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          API Server                                     │
//! │                                                                         │
//! │  Client ───► axum (5000) ───► Handlers ───► Services ───► SQLite       │
//! │                  │                              │                       │
//! │                  ▼                              ▼                       │
//! │             AuthContext                   bazario-core                  │
//! │          (JWT extractor)             (discount math, codes)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers stay thin: they extract the caller identity, check the role,
//! and delegate to a service. All voucher state transitions happen in the
//! database layer's conditional updates; services only sequence them and
//! translate outcomes into API errors.

pub mod auth;
pub mod config;
pub mod display;
pub mod error;
pub mod rest;
pub mod services;

use std::sync::Arc;

use bazario_db::Database;

use crate::auth::JwtManager;
use crate::config::AppConfig;

/// Shared application state. Cloned per request; everything inside is
/// either an `Arc` or pool-backed.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    /// Creates the shared state from a connected database and loaded config.
    pub fn new(db: Database, config: AppConfig) -> Self {
        let jwt = JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        );

        AppState {
            db,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
        }
    }
}
