//! Horizon API - missions, daily pulse, and AI mentor.
//!
//! This crate provides the backend for the Horizon wellness platform as a
//! single Rust service:
//!
//! - **Missions**: recurring habits with cadence-based instance rolling,
//!   a completion/claim lifecycle, and XP/coin rewards
//! - **Daily Pulse**: one mood/reflection entry per calendar day, with an
//!   AI-generated prompt and micro-habit suggestion
//! - **Streaks & badges**: a daily streak with a freeze grace mechanic,
//!   and idempotent one-time achievement badges
//! - **Mentor**: a chat endpoint that assembles the user's recent context
//!   and talks to an OpenAI-compatible AI gateway with tool calling
//!
//! # Architecture
//!
//! The service is organized into several key modules:
//!
//! - [`config`]: Configuration management and environment loading
//! - [`auth`]: Bearer-token authentication middleware
//! - [`domain`]: Core domain models (missions, periods, streaks, badges)
//! - [`database`]: Embedded SQLite store and schema
//! - [`mentor`]: AI gateway client and context assembly
//! - [`api`]: HTTP API endpoints
//!
//! # Example
//!
//! ```rust,ignore
//! use horizon_api::{config::AppConfig, server::create_app};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     let app = create_app(config).await?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod domain;
pub mod logging;
pub mod mentor;
pub mod server;
pub mod validation;

use std::sync::Arc;

use config::AppConfig;
use database::SqliteStore;
use mentor::MentorGateway;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Embedded SQLite store (cheap to clone, shares one connection).
    pub store: SqliteStore,
    /// AI mentor gateway. Trait object so tests can substitute a stub.
    pub mentor: Arc<dyn MentorGateway>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"AppConfig")
            .field("store", &self.store)
            .field("mentor", &"MentorGateway")
            .finish()
    }
}
