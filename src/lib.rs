//! catalog-emit: describe datasets, jobs and flows as data, then upsert the
//! resulting schema, lineage and flow descriptors into a metadata catalog.
//!
//! - [`plan`] - the declarative batch (tables, jobs, flows) and its loader
//! - [`workflow`] - builds proposals from a plan and submits them in order
//! - [`config`] - sink selection, emitter settings and audit identity
//! - [`error`] - plan and workflow errors
//!
//! Identifier and descriptor types live in `catalog_types`; the emitter
//! trait and its implementations in `catalog_client`.

pub mod config;
pub mod error;
pub mod plan;
pub mod workflow;

pub use config::{Settings, SinkConfig};
pub use error::{PlanError, WorkflowError};
pub use plan::{Plan, PlanLoader};
pub use workflow::{EmittedProposal, RunReport, Workflow};
