//! Run configuration.
//!
//! Emitter settings, sink selection, and the audit identity stamped on
//! every descriptor. Built from defaults, then environment, then CLI flags.

use std::path::PathBuf;

use catalog_client::{Emitter, EmitterConfig, FileEmitter, InMemoryCatalog, RestEmitter};
use catalog_types::{ArgumentError, AuditContext, EmitError};

use crate::plan::AuditPlan;

pub const ENV_ACTOR: &str = "CATALOG_ACTOR";
pub const DEFAULT_ACTOR: &str = "ingestion";

/// Where proposals go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SinkConfig {
    /// POST to the catalog's REST ingestion endpoint.
    #[default]
    Rest,
    /// Append JSON lines to a file.
    File { path: PathBuf },
    /// Apply to an in-process catalog and discard.
    Memory,
}

impl SinkConfig {
    /// Open the configured sink.
    pub async fn open(&self, emitter: &EmitterConfig) -> Result<Box<dyn Emitter>, EmitError> {
        Ok(match self {
            Self::Rest => Box::new(RestEmitter::new(emitter)?),
            Self::File { path } => Box::new(FileEmitter::create(path.clone()).await?),
            Self::Memory => Box::new(InMemoryCatalog::new()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub emitter: EmitterConfig,

    pub sink: SinkConfig,

    /// Username stamped on descriptors. Overrides the plan's actor when set.
    pub actor: Option<String>,

    /// Fixed audit time. Overrides the plan's time when set.
    pub audit_time_millis: Option<i64>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            emitter: EmitterConfig::from_lookup(&lookup),
            sink: SinkConfig::default(),
            actor: lookup(ENV_ACTOR).filter(|v| !v.is_empty()),
            audit_time_millis: None,
        }
    }

    pub fn with_sink(mut self, sink: SinkConfig) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_audit_time(mut self, millis: i64) -> Self {
        self.audit_time_millis = Some(millis);
        self
    }

    /// Audit context for a run: explicit settings first, then the plan's
    /// audit block, then `ingestion` at the current time.
    pub fn audit_context(&self, plan: Option<&AuditPlan>) -> Result<AuditContext, ArgumentError> {
        let actor = self
            .actor
            .as_deref()
            .or(plan.map(|a| a.actor.as_str()))
            .unwrap_or(DEFAULT_ACTOR);
        let time = self
            .audit_time_millis
            .or_else(|| plan.and_then(|a| a.time_millis));
        AuditContext::for_user(actor, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_audit() -> AuditPlan {
        AuditPlan {
            time_millis: Some(1_640_692_800_000),
            actor: "etl".into(),
        }
    }

    #[test]
    fn test_env_lookup() {
        let settings = Settings::from_lookup(|k| match k {
            ENV_ACTOR => Some("svc_catalog".to_string()),
            "CATALOG_GMS_URL" => Some("http://gms:8080".to_string()),
            _ => None,
        });
        assert_eq!(settings.actor.as_deref(), Some("svc_catalog"));
        assert_eq!(settings.emitter.gms_url, "http://gms:8080");
        assert_eq!(settings.sink, SinkConfig::Rest);
    }

    #[test]
    fn test_plan_audit_used_when_unset() {
        let audit = Settings::default().audit_context(Some(&plan_audit())).unwrap();
        assert_eq!(audit.time_millis(), 1_640_692_800_000);
        assert_eq!(audit.actor().as_str(), "urn:li:corpuser:etl");
    }

    #[test]
    fn test_settings_override_plan() {
        let settings = Settings::default().with_actor("alice").with_audit_time(42);
        let audit = settings.audit_context(Some(&plan_audit())).unwrap();
        assert_eq!(audit.time_millis(), 42);
        assert_eq!(audit.actor().as_str(), "urn:li:corpuser:alice");
    }

    #[test]
    fn test_default_actor() {
        let audit = Settings::default().audit_context(None).unwrap();
        assert_eq!(audit.actor().as_str(), "urn:li:corpuser:ingestion");
        assert!(audit.time_millis() > 1_640_692_800_000);
    }

    #[tokio::test]
    async fn test_open_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SinkConfig::File {
            path: dir.path().join("out.jsonl"),
        };
        let emitter = sink.open(&EmitterConfig::default()).await.unwrap();
        assert!(emitter.describe().starts_with("file "));
    }
}
