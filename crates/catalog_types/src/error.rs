use thiserror::Error;

use crate::urn::EntityType;

/// Usage errors detected before anything leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("{0} must not be empty")]
    MissingAttribute(&'static str),

    #[error("malformed urn '{0}'")]
    MalformedUrn(String),

    #[error("aspect {aspect} cannot be attached to a {entity_type} urn")]
    AspectMismatch {
        aspect: &'static str,
        entity_type: EntityType,
    },

    #[error("expected a {expected} urn, got '{urn}'")]
    UnexpectedEntityType { expected: EntityType, urn: String },

    #[error("invalid url '{0}'")]
    InvalidUrl(String),

    #[error("invalid header '{0}'")]
    InvalidHeader(String),
}

/// Failure of a single change-proposal submission.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),

    #[error("validation error ({status}): {message}")]
    Validation { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EmitError {
    /// Transport failures leave the catalog untouched, so the same proposal
    /// can be submitted again as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// HTTP status reported by the catalog, if the failure came from one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Validation { status, .. } => Some(*status),
            _ => None,
        }
    }
}
