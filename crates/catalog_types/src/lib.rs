//! Catalog Types - foundation types for metadata change proposals
//!
//! Pure data structures and pure builders shared by the emitter client and
//! the workflow crate:
//!
//! - [`urn`] - deterministic entity identifiers (dataset, flow, job, ...)
//! - [`aspect`] - schema, lineage and flow descriptors
//! - [`audit`] - audit stamps and the context that produces them
//! - [`proposal`] - the upsert envelope pairing one urn with one aspect
//! - [`error`] - argument and emit errors
//!
//! Nothing in this crate performs I/O.

pub mod aspect;
pub mod audit;
pub mod error;
pub mod proposal;
pub mod urn;

pub use aspect::{
    Aspect, DataFlowInfo, DataJobInputOutput, FieldSpec, FieldType, PlatformSchema, SchemaField,
    SchemaMetadata, SchemaMetadataBuilder,
};
pub use audit::{AuditContext, AuditStamp};
pub use error::{ArgumentError, EmitError};
pub use proposal::{ChangeProposal, ChangeType};
pub use urn::{
    corp_user_urn, data_flow_urn, data_job_urn, data_platform_urn, dataset_urn, DatasetRef,
    EntityType, FlowRef, JobRef, Urn,
};
