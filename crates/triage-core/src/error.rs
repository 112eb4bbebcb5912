//! Error types for triage

/// Result type alias using triage's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for triage operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Category classifier or vectorizer was not loaded at startup
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// A risk artifact required for a category does not exist
    #[error("artifact missing: {0}")]
    ArtifactMissing(String),

    /// A risk artifact exists but could not be decoded or validated
    #[error("artifact '{name}' is corrupt: {reason}")]
    ArtifactCorrupt { name: String, reason: String },

    /// Feature dimension disagrees with what a model was fitted against
    #[error("feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new model unavailable error
    pub fn model_unavailable(msg: impl Into<String>) -> Self {
        Self::ModelUnavailable(msg.into())
    }

    /// Create a new artifact missing error
    pub fn artifact_missing(name: impl Into<String>) -> Self {
        Self::ArtifactMissing(name.into())
    }

    /// Create a new artifact corrupt error
    pub fn artifact_corrupt(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::ArtifactCorrupt {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Map this error onto the fault taxonomy used for logging and metrics
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::ModelUnavailable(_) => FaultKind::ModelUnavailable,
            Self::ArtifactMissing(_) => FaultKind::ArtifactMissing,
            Self::ArtifactCorrupt { .. }
            | Self::DimensionMismatch { .. }
            | Self::Io(_)
            | Self::Serialization(_) => FaultKind::ArtifactCorrupt,
            Self::Config(_) | Self::Internal(_) => FaultKind::InternalFault,
        }
    }
}

/// Fault taxonomy.
///
/// Every kind resolves to a sentinel label for the caller; the kind only
/// decides how loudly the failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Text was missing or blank; not an error at all
    InputEmpty,
    /// Core models failed to load at startup
    ModelUnavailable,
    /// No risk sub-model exists for a category
    ArtifactMissing,
    /// A risk sub-model exists but failed to load or execute
    ArtifactCorrupt,
    /// Anything else that went wrong during inference
    InternalFault,
}

impl FaultKind {
    /// Stable name used as a metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputEmpty => "input_empty",
            Self::ModelUnavailable => "model_unavailable",
            Self::ArtifactMissing => "artifact_missing",
            Self::ArtifactCorrupt => "artifact_corrupt",
            Self::InternalFault => "internal_fault",
        }
    }
}
