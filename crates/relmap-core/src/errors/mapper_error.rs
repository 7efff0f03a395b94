//! Errors raised by the mapper.
//!
//! Driver failures pass through untouched in `Driver`; everything the mapper
//! decides on its own has a dedicated variant.

/// Errors that can occur while describing, encoding or persisting records.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    /// The connection pool has not been opened yet.
    #[error("NOT VALID: database connection has not been opened")]
    NotValid,

    #[error("RECORD NOT FOUND")]
    NotFound,

    /// A field kind outside the codec mapping, or a malformed record description.
    #[error("UNSUPPORTED TYPE: {type_name}: {reason}")]
    UnsupportedType { type_name: String, reason: String },

    /// A schema or query precondition was violated.
    #[error("BAD PARAMETER: {reason}")]
    BadParameter { reason: String },

    #[error("failed to decode column `{column}`: {reason}")]
    Decode { column: String, reason: String },

    #[error("document encoding failed: {0}")]
    Document(#[from] serde_json::Error),

    #[error("unknown database driver `{driver}`")]
    UnknownDriver { driver: String },

    #[error("database connection is already open")]
    AlreadyOpen,

    #[error("timed out waiting for a pooled connection ({capacity} open)")]
    PoolTimeout { capacity: usize },

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Driver(#[from] rusqlite::Error),
}

/// Convenience type alias.
pub type MapperResult<T> = Result<T, MapperError>;

impl MapperError {
    pub fn bad_parameter(reason: impl Into<String>) -> Self {
        Self::BadParameter {
            reason: reason.into(),
        }
    }

    pub fn unsupported(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub fn decode(column: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            column: column.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable code for each variant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotValid => "NOT_VALID",
            Self::NotFound => "NOT_FOUND",
            Self::UnsupportedType { .. } => "UNSUPPORTED_TYPE",
            Self::BadParameter { .. } => "BAD_PARAMETER",
            Self::Decode { .. } => "DECODE_FAILED",
            Self::Document(_) => "DOCUMENT_ERROR",
            Self::UnknownDriver { .. } => "UNKNOWN_DRIVER",
            Self::AlreadyOpen => "ALREADY_OPEN",
            Self::PoolTimeout { .. } => "POOL_TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Driver(_) => "DRIVER_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
