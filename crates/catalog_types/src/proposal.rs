//! Change proposals: one aspect for one entity, applied as an upsert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aspect::Aspect;
use crate::error::ArgumentError;
use crate::urn::{EntityType, Urn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    /// Replace the entity's aspect of this kind wholesale.
    Upsert,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upsert => write!(f, "UPSERT"),
        }
    }
}

/// Envelope pairing one urn with exactly one aspect.
///
/// Created per submission and discarded afterwards. The catalog keys the
/// upsert on `(entity_urn, aspect name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeProposal {
    pub entity_type: EntityType,
    pub entity_urn: Urn,
    pub change_type: ChangeType,
    pub aspect: Aspect,
    pub created_at: DateTime<Utc>,
}

impl ChangeProposal {
    /// Fails when the aspect does not apply to the urn's entity kind.
    pub fn upsert(entity_urn: Urn, aspect: impl Into<Aspect>) -> Result<Self, ArgumentError> {
        let aspect = aspect.into();
        let entity_type = entity_urn.entity_type();
        if aspect.target() != entity_type {
            return Err(ArgumentError::AspectMismatch {
                aspect: aspect.name(),
                entity_type,
            });
        }
        Ok(Self {
            entity_type,
            entity_urn,
            change_type: ChangeType::Upsert,
            aspect,
            created_at: Utc::now(),
        })
    }

    /// Re-checks a proposal that was not built through [`upsert`](Self::upsert),
    /// e.g. one read back from a captured log.
    pub fn validate(&self) -> Result<(), ArgumentError> {
        let entity_type = self.entity_urn.entity_type();
        if self.entity_type != entity_type {
            return Err(ArgumentError::UnexpectedEntityType {
                expected: self.entity_type,
                urn: self.entity_urn.to_string(),
            });
        }
        if self.aspect.target() != entity_type {
            return Err(ArgumentError::AspectMismatch {
                aspect: self.aspect.name(),
                entity_type,
            });
        }
        Ok(())
    }

    pub fn aspect_name(&self) -> &'static str {
        self.aspect.name()
    }

    /// Upsert key: two proposals with equal keys overwrite each other.
    pub fn key(&self) -> (&Urn, &'static str) {
        (&self.entity_urn, self.aspect.name())
    }
}
