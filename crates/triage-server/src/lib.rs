//! Triage Server
//!
//! HTTP front end for the incident triage pipeline. Incident reports are
//! posted as JSON and answered with a category and risk level; model
//! failures never surface as HTTP errors.

pub mod config;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use routes::{create_router, AppError};
pub use state::AppState;
