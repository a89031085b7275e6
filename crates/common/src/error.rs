//! Error types shared across Glider crates.

/// Top-level error type for Glider operations.
#[derive(Debug, thiserror::Error)]
pub enum GliderError {
    /// Malformed input at a call boundary. Raised before any state is touched.
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// A pointer driver call failed.
    #[error("Pointer driver error: {message}")]
    Driver { message: String },

    /// The engine is not in a state that accepts the call.
    #[error("Lifecycle error: {message}")]
    Lifecycle { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Platform error: {message}")]
    Platform { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using GliderError.
pub type GliderResult<T> = Result<T, GliderError>;

impl GliderError {
    pub fn validation(field: &'static str, msg: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: msg.into(),
        }
    }

    pub fn driver(msg: impl Into<String>) -> Self {
        Self::Driver {
            message: msg.into(),
        }
    }

    pub fn lifecycle(msg: impl Into<String>) -> Self {
        Self::Lifecycle {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Lifecycle { .. })
    }

    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}
