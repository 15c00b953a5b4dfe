//! Workflow and plan errors.

use catalog_types::{ArgumentError, EmitError, Urn};
use thiserror::Error;

/// Errors raised while loading or validating a plan document.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("unknown builtin plan '{name}' (available: {available})")]
    UnknownBuiltin { name: String, available: String },

    #[error("failed to parse plan: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("plan '{0}' has no tables, jobs or flows")]
    Empty(String),
}

/// Errors raised by [`Workflow::run`](crate::workflow::Workflow::run).
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// An identifier or descriptor could not be built. Raised before
    /// anything is submitted.
    #[error("invalid {context}: {source}")]
    InvalidArgument {
        context: String,
        #[source]
        source: ArgumentError,
    },

    /// The emitter rejected or failed to deliver one proposal. Everything
    /// before it was accepted; nothing after it was sent.
    #[error("failed to emit {aspect} for {urn}: {source}")]
    Emit {
        urn: Urn,
        aspect: &'static str,
        #[source]
        source: EmitError,
    },

    /// Every proposal was accepted but the sink failed to flush.
    #[error("failed to flush {sink}: {source}")]
    Flush {
        sink: String,
        #[source]
        source: EmitError,
    },

    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl WorkflowError {
    pub(crate) fn invalid(context: impl Into<String>, source: ArgumentError) -> Self {
        Self::InvalidArgument {
            context: context.into(),
            source,
        }
    }

    /// The failing `(urn, aspect)` pair, when the failure came from the emitter.
    pub fn failed_pair(&self) -> Option<(&Urn, &'static str)> {
        match self {
            Self::Emit { urn, aspect, .. } => Some((urn, aspect)),
            _ => None,
        }
    }
}
