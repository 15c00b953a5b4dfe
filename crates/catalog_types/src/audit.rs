//! Audit stamps and the context that produces them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ArgumentError;
use crate::urn::{corp_user_urn, Urn};

/// Who changed something, and when (epoch milliseconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub time: i64,
    pub actor: Urn,
}

/// Time source and identity threaded through descriptor construction.
///
/// The clock is read once, when the context is created, so every stamp of
/// a run carries the same time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    time_millis: i64,
    actor: Urn,
}

impl AuditContext {
    /// Current wall-clock time for the given actor.
    pub fn now(actor: Urn) -> Self {
        Self::at(Utc::now(), actor)
    }

    pub fn at(time: DateTime<Utc>, actor: Urn) -> Self {
        Self {
            time_millis: time.timestamp_millis(),
            actor,
        }
    }

    /// Pinned time, for reproducible runs.
    pub fn fixed(time_millis: i64, actor: Urn) -> Self {
        Self { time_millis, actor }
    }

    /// Convenience for a bare username or corp-user urn.
    pub fn for_user(username: &str, time_millis: Option<i64>) -> Result<Self, ArgumentError> {
        let actor = corp_user_urn(username)?;
        Ok(match time_millis {
            Some(t) => Self::fixed(t, actor),
            None => Self::now(actor),
        })
    }

    pub fn time_millis(&self) -> i64 {
        self.time_millis
    }

    pub fn actor(&self) -> &Urn {
        &self.actor
    }

    pub fn stamp(&self) -> AuditStamp {
        AuditStamp {
            time: self.time_millis,
            actor: self.actor.clone(),
        }
    }
}
