//! In-process catalog.
//!
//! Applies proposals with the same full-replace semantics the real catalog
//! has, and lets callers read the stored aspects back. Used by tests and by
//! dry runs that should exercise the whole workflow without a server.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use catalog_types::{
    aspect, Aspect, ChangeProposal, DataFlowInfo, DataJobInputOutput, EmitError, SchemaMetadata,
    Urn,
};

use crate::{Emitter, Result};

/// Stored aspects keyed by `(urn, aspect name)`.
pub type AspectMap = BTreeMap<(Urn, String), Aspect>;

#[derive(Default)]
pub struct InMemoryCatalog {
    aspects: Mutex<AspectMap>,
    writes: AtomicU64,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AspectMap> {
        self.aspects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_aspect(&self, urn: &Urn, aspect_name: &str) -> Option<Aspect> {
        self.lock()
            .get(&(urn.clone(), aspect_name.to_string()))
            .cloned()
    }

    pub fn schema_metadata(&self, urn: &Urn) -> Option<SchemaMetadata> {
        match self.get_aspect(urn, aspect::SCHEMA_METADATA)? {
            Aspect::SchemaMetadata(a) => Some(a),
            _ => None,
        }
    }

    pub fn lineage(&self, urn: &Urn) -> Option<DataJobInputOutput> {
        match self.get_aspect(urn, aspect::DATA_JOB_INPUT_OUTPUT)? {
            Aspect::DataJobInputOutput(a) => Some(a),
            _ => None,
        }
    }

    pub fn flow_info(&self, urn: &Urn) -> Option<DataFlowInfo> {
        match self.get_aspect(urn, aspect::DATA_FLOW_INFO)? {
            Aspect::DataFlowInfo(a) => Some(a),
            _ => None,
        }
    }

    /// Copy of everything stored, for before/after comparisons.
    pub fn snapshot(&self) -> AspectMap {
        self.lock().clone()
    }

    /// Distinct urns with at least one aspect, in sorted order.
    pub fn urns(&self) -> Vec<Urn> {
        let mut urns: Vec<Urn> = self.lock().keys().map(|(urn, _)| urn.clone()).collect();
        urns.dedup();
        urns
    }

    /// Number of stored aspects.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of accepted proposals, including ones that changed nothing.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Emitter for InMemoryCatalog {
    async fn emit(&self, proposal: &ChangeProposal) -> Result<()> {
        let target = proposal.aspect.target();
        if target != proposal.entity_urn.entity_type() {
            return Err(EmitError::Validation {
                status: 422,
                message: format!(
                    "aspect {} is not valid for {}",
                    proposal.aspect_name(),
                    proposal.entity_urn
                ),
            });
        }

        let key = (proposal.entity_urn.clone(), proposal.aspect_name().to_string());
        let replaced = self.lock().insert(key, proposal.aspect.clone()).is_some();
        self.writes.fetch_add(1, Ordering::Relaxed);

        debug!(
            urn = %proposal.entity_urn,
            aspect = proposal.aspect_name(),
            replaced,
            "stored aspect"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
