//! Triage Core
//!
//! Core types and error handling shared across the triage crates.
//!
//! This crate provides:
//! - Label types for incident categories and risk levels
//! - The sparse feature vector passed between vectorizers and cluster models
//! - The prediction result handed back to callers
//! - Error types, result handling, and the fault taxonomy used for logging

pub mod error;
pub mod types;

pub use error::{Error, FaultKind, Result};
pub use types::{
    CategoryKey, CategoryLabel, ClusterId, FeatureVector, PredictionResult, RiskLabel,
    MODEL_NOT_LOADED, UNKNOWN,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, FaultKind, Result};
    pub use crate::types::{
        CategoryKey, CategoryLabel, ClusterId, FeatureVector, PredictionResult, RiskLabel,
    };
}
