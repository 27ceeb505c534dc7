//! Health Tracker Server Library
//!
//! REST backend for personal health tracking: accounts, daily health records
//! with vital signs, and period statistics. Exported for the binary and tests.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod security;
pub mod stats;

pub use config::Config;
pub use db::{open_database, Db};
pub use error::{AppError, Result};
pub use routes::create_router;

/// Store handle and configuration cloned into every handler
///
/// Handlers receive the store and config from here and the acting user from
/// the auth middleware; there is no other shared state.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
}

impl AppState {
    pub fn new(db: Db, config: Config) -> Self {
        Self { db, config }
    }
}
