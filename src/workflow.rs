//! Workflow orchestration.
//!
//! Turns a [`Plan`] into change proposals and submits them one at a time:
//! table schemas, then job lineage, then flow info. The first emitter
//! failure stops the run. Nothing is rolled back; every accepted proposal
//! is an idempotent upsert, so the failed one can be retried on its own.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use catalog_client::Emitter;
use catalog_types::{Aspect, AuditContext, ChangeProposal, Urn};

use crate::error::WorkflowError;
use crate::plan::{FlowPlan, JobPlan, Plan, TablePlan};

/// One accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmittedProposal {
    pub urn: Urn,
    pub aspect: &'static str,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub plan: String,
    pub sink: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Accepted proposals in submission order.
    pub emitted: Vec<EmittedProposal>,
}

impl RunReport {
    pub fn count(&self, aspect: &str) -> usize {
        self.emitted.iter().filter(|e| e.aspect == aspect).count()
    }
}

pub struct Workflow<'a> {
    emitter: &'a dyn Emitter,
    audit: AuditContext,
}

impl<'a> Workflow<'a> {
    pub fn new(emitter: &'a dyn Emitter, audit: AuditContext) -> Self {
        Self { emitter, audit }
    }

    pub fn audit(&self) -> &AuditContext {
        &self.audit
    }

    /// Submit every proposal of `plan`.
    ///
    /// Identifiers and descriptors for the whole plan are built before the
    /// first submission, so an `InvalidArgument` means nothing was sent.
    pub async fn run(&self, plan: &Plan) -> Result<RunReport, WorkflowError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();
        let sink = self.emitter.describe();

        let proposals = plan.proposals(&self.audit)?;
        info!(
            %run_id,
            plan = %plan.name,
            %sink,
            tables = plan.tables.len(),
            jobs = plan.jobs.len(),
            flows = plan.flows.len(),
            "Starting catalog run"
        );

        let mut emitted = Vec::with_capacity(proposals.len());
        for proposal in &proposals {
            self.submit(proposal).await?;
            emitted.push(EmittedProposal {
                urn: proposal.entity_urn.clone(),
                aspect: proposal.aspect_name(),
            });
        }

        self.emitter
            .flush()
            .await
            .map_err(|source| WorkflowError::Flush {
                sink: sink.clone(),
                source,
            })?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(%run_id, emitted = emitted.len(), elapsed_ms, "Catalog run complete");

        Ok(RunReport {
            run_id,
            plan: plan.name.clone(),
            sink,
            started_at,
            elapsed_ms,
            emitted,
        })
    }

    /// Build and submit the schema of one table.
    pub async fn emit_table(&self, table: &TablePlan) -> Result<Urn, WorkflowError> {
        let context = || format!("table {}", table.dataset.name);
        let urn = table
            .urn()
            .map_err(|e| WorkflowError::invalid(context(), e))?;
        let schema = table
            .schema(&self.audit)
            .map_err(|e| WorkflowError::invalid(context(), e))?;
        self.build_and_submit(urn, schema, context).await
    }

    /// Build and submit the lineage of one job.
    pub async fn emit_job(&self, job: &JobPlan) -> Result<Urn, WorkflowError> {
        let context = || format!("job {}", job.job.job_id);
        let urn = job.urn().map_err(|e| WorkflowError::invalid(context(), e))?;
        let lineage = job
            .lineage()
            .map_err(|e| WorkflowError::invalid(context(), e))?;
        self.build_and_submit(urn, lineage, context).await
    }

    /// Build and submit the descriptor of one flow.
    pub async fn emit_flow(&self, flow: &FlowPlan) -> Result<Urn, WorkflowError> {
        let context = || format!("flow {}", flow.flow.flow_id);
        let urn = flow
            .flow
            .urn()
            .map_err(|e| WorkflowError::invalid(context(), e))?;
        self.build_and_submit(urn, flow.info(), context).await
    }

    async fn build_and_submit(
        &self,
        urn: Urn,
        aspect: impl Into<Aspect>,
        context: impl Fn() -> String,
    ) -> Result<Urn, WorkflowError> {
        let proposal = ChangeProposal::upsert(urn, aspect)
            .map_err(|e| WorkflowError::invalid(context(), e))?;
        self.submit(&proposal).await?;
        Ok(proposal.entity_urn)
    }

    /// Submit one proposal, naming the `(urn, aspect)` pair on failure.
    pub async fn submit(&self, proposal: &ChangeProposal) -> Result<(), WorkflowError> {
        if let Aspect::SchemaMetadata(schema) = &proposal.aspect {
            let duplicates = schema.duplicate_paths();
            if !duplicates.is_empty() {
                warn!(
                    urn = %proposal.entity_urn,
                    ?duplicates,
                    "Schema repeats field paths; submitting all occurrences"
                );
            }
        }

        self.emitter
            .emit(proposal)
            .await
            .map_err(|source| WorkflowError::Emit {
                urn: proposal.entity_urn.clone(),
                aspect: proposal.aspect_name(),
                source,
            })?;

        info!(
            urn = %proposal.entity_urn,
            aspect = proposal.aspect_name(),
            "Emitted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_client::InMemoryCatalog;
    use catalog_types::{aspect, DatasetRef, FieldSpec, FieldType, FlowRef, JobRef};

    fn audit() -> AuditContext {
        AuditContext::for_user("ingestion", Some(1_640_692_800_000)).unwrap()
    }

    fn table(name: &str, fields: &[&str]) -> TablePlan {
        fields.iter().fold(
            TablePlan::new(DatasetRef::new("hive", name, "PROD")),
            |t, path| t.with_field(FieldSpec::new(*path, FieldType::Number, "integer", *path)),
        )
    }

    #[tokio::test]
    async fn test_run_reports_in_order() {
        let catalog = InMemoryCatalog::new();
        let job = JobRef::new("spark", "social_warehouse", "join", "PROD");
        let plan = Plan::new("small")
            .with_table(table("social_db.a", &["id"]))
            .with_table(table("social_db.b", &["id"]))
            .with_job(
                JobPlan::new(job.clone())
                    .with_input(DatasetRef::new("hive", "social_db.a", "PROD"))
                    .with_output(DatasetRef::new("hive", "social_db.b", "PROD")),
            )
            .with_flow(FlowPlan::new(job.flow(), "Warehouse"));

        let report = Workflow::new(&catalog, audit()).run(&plan).await.unwrap();

        assert_eq!(report.plan, "small");
        assert_eq!(report.sink, "memory");
        assert_eq!(report.emitted.len(), 4);
        assert_eq!(report.count(aspect::SCHEMA_METADATA), 2);
        assert_eq!(report.emitted[2].aspect, aspect::DATA_JOB_INPUT_OUTPUT);
        assert_eq!(report.emitted[3].urn, job.flow().urn().unwrap());
        assert_eq!(catalog.len(), 4);
    }

    #[tokio::test]
    async fn test_single_steps() {
        let catalog = InMemoryCatalog::new();
        let workflow = Workflow::new(&catalog, audit());

        let urn = workflow
            .emit_table(&table("social_db.users", &["user_id", "email"]))
            .await
            .unwrap();
        assert_eq!(
            catalog.schema_metadata(&urn).unwrap().field_paths().collect::<Vec<_>>(),
            vec!["user_id", "email"]
        );

        let flow_ref = FlowRef::new("spark", "social_warehouse", "prod");
        let flow = FlowPlan::new(flow_ref, "Social Warehouse");
        let urn = workflow.emit_flow(&flow).await.unwrap();
        assert_eq!(catalog.flow_info(&urn).unwrap().name, "Social Warehouse");

        let job = JobPlan::new(JobRef::new("airflow", "f", "j", "PROD"));
        let urn = workflow.emit_job(&job).await.unwrap();
        assert!(catalog.lineage(&urn).unwrap().input_datasets.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_paths_are_submitted() {
        let catalog = InMemoryCatalog::new();
        let urn = Workflow::new(&catalog, audit())
            .emit_table(&table("social_db.t", &["id", "id"]))
            .await
            .unwrap();
        let stored = catalog.schema_metadata(&urn).unwrap();
        assert_eq!(stored.fields.len(), 2);
        assert_eq!(stored.duplicate_paths(), vec!["id"]);
    }
}
