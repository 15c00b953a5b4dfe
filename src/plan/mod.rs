//! Declarative batch description consumed by the workflow.

pub mod loader;
pub mod types;

pub use loader::{builtin, builtin_names, PlanLoader};
pub use types::{AuditPlan, FlowPlan, JobPlan, Plan, TablePlan};
