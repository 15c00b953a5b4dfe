//! Plan document types.
//!
//! A plan is data: the tables whose schemas should be published, the jobs
//! whose lineage should be recorded, and the flows those jobs belong to.
//! One generic builder turns it into change proposals.

use serde::{Deserialize, Serialize};

use catalog_types::{
    ArgumentError, AuditContext, ChangeProposal, DataFlowInfo, DataJobInputOutput, DatasetRef,
    FieldSpec, FlowRef, JobRef, SchemaMetadata, SchemaMetadataBuilder, Urn,
};

use crate::error::WorkflowError;

/// Audit identity recorded in a plan file. Overridable from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPlan {
    /// Milliseconds since the epoch. Absent means "now".
    #[serde(default)]
    pub time_millis: Option<i64>,
    pub actor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditPlan>,
    #[serde(default)]
    pub tables: Vec<TablePlan>,
    #[serde(default)]
    pub jobs: Vec<JobPlan>,
    #[serde(default)]
    pub flows: Vec<FlowPlan>,
}

/// One dataset and its ordered field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePlan {
    #[serde(flatten)]
    pub dataset: DatasetRef,
    /// Defaults to the last dotted segment of the dataset name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub raw_schema: String,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Lineage for one job: which datasets and upstream jobs feed it, and what it writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPlan {
    #[serde(flatten)]
    pub job: JobRef,
    #[serde(default)]
    pub inputs: Vec<DatasetRef>,
    #[serde(default)]
    pub outputs: Vec<DatasetRef>,
    #[serde(default)]
    pub input_jobs: Vec<JobRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowPlan {
    #[serde(flatten)]
    pub flow: FlowRef,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Plan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            audit: None,
            tables: Vec::new(),
            jobs: Vec::new(),
            flows: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: TablePlan) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_job(mut self, job: JobPlan) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn with_flow(mut self, flow: FlowPlan) -> Self {
        self.flows.push(flow);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.jobs.is_empty() && self.flows.is_empty()
    }

    /// Number of proposals a run of this plan submits.
    pub fn proposal_count(&self) -> usize {
        self.tables.len() + self.jobs.len() + self.flows.len()
    }

    /// Build every proposal of the plan, in submission order: schemas, then
    /// lineage, then flow info.
    ///
    /// All identifiers are built here, so a bad attribute anywhere in the
    /// plan fails the whole batch before anything is submitted.
    pub fn proposals(&self, audit: &AuditContext) -> Result<Vec<ChangeProposal>, WorkflowError> {
        let mut proposals = Vec::with_capacity(self.proposal_count());

        for (i, table) in self.tables.iter().enumerate() {
            let context = || format!("table #{} ({})", i + 1, table.dataset.name);
            let urn = table
                .urn()
                .map_err(|e| WorkflowError::invalid(context(), e))?;
            let schema = table
                .schema(audit)
                .map_err(|e| WorkflowError::invalid(context(), e))?;
            let proposal = ChangeProposal::upsert(urn, schema)
                .map_err(|e| WorkflowError::invalid(context(), e))?;
            proposals.push(proposal);
        }

        for (i, job) in self.jobs.iter().enumerate() {
            let context = || format!("job #{} ({})", i + 1, job.job.job_id);
            let urn = job.urn().map_err(|e| WorkflowError::invalid(context(), e))?;
            let lineage = job
                .lineage()
                .map_err(|e| WorkflowError::invalid(context(), e))?;
            let proposal = ChangeProposal::upsert(urn, lineage)
                .map_err(|e| WorkflowError::invalid(context(), e))?;
            proposals.push(proposal);
        }

        for (i, flow) in self.flows.iter().enumerate() {
            let context = || format!("flow #{} ({})", i + 1, flow.flow.flow_id);
            let urn = flow
                .flow
                .urn()
                .map_err(|e| WorkflowError::invalid(context(), e))?;
            let proposal = ChangeProposal::upsert(urn, flow.info())
                .map_err(|e| WorkflowError::invalid(context(), e))?;
            proposals.push(proposal);
        }

        Ok(proposals)
    }
}

impl TablePlan {
    pub fn new(dataset: DatasetRef) -> Self {
        Self {
            dataset,
            schema_name: None,
            raw_schema: String::new(),
            version: 0,
            hash: String::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_raw_schema(mut self, raw_schema: impl Into<String>) -> Self {
        self.raw_schema = raw_schema.into();
        self
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn urn(&self) -> Result<Urn, ArgumentError> {
        self.dataset.urn()
    }

    pub fn schema_name(&self) -> &str {
        self.schema_name
            .as_deref()
            .unwrap_or_else(|| self.dataset.short_name())
    }

    pub fn schema(&self, audit: &AuditContext) -> Result<SchemaMetadata, ArgumentError> {
        SchemaMetadataBuilder::new(self.schema_name(), self.dataset.platform.as_str())
            .version(self.version)
            .hash(self.hash.as_str())
            .raw_schema(self.raw_schema.as_str())
            .fields(self.fields.iter().cloned())
            .build(audit)
    }
}

impl JobPlan {
    pub fn new(job: JobRef) -> Self {
        Self {
            job,
            inputs: Vec::new(),
            outputs: Vec::new(),
            input_jobs: Vec::new(),
        }
    }

    pub fn with_input(mut self, dataset: DatasetRef) -> Self {
        self.inputs.push(dataset);
        self
    }

    pub fn with_output(mut self, dataset: DatasetRef) -> Self {
        self.outputs.push(dataset);
        self
    }

    pub fn with_input_job(mut self, job: JobRef) -> Self {
        self.input_jobs.push(job);
        self
    }

    pub fn urn(&self) -> Result<Urn, ArgumentError> {
        self.job.urn()
    }

    pub fn lineage(&self) -> Result<DataJobInputOutput, ArgumentError> {
        let inputs = self
            .inputs
            .iter()
            .map(DatasetRef::urn)
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = self
            .outputs
            .iter()
            .map(DatasetRef::urn)
            .collect::<Result<Vec<_>, _>>()?;
        let input_jobs = self
            .input_jobs
            .iter()
            .map(JobRef::urn)
            .collect::<Result<Vec<_>, _>>()?;
        DataJobInputOutput::new(inputs, outputs, input_jobs)
    }
}

impl FlowPlan {
    pub fn new(flow: FlowRef, name: impl Into<String>) -> Self {
        Self {
            flow,
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn info(&self) -> DataFlowInfo {
        let info = DataFlowInfo::new(self.name.as_str());
        match &self.description {
            Some(description) => info.with_description(description.as_str()),
            None => info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_types::{aspect, FieldType};

    fn audit() -> AuditContext {
        AuditContext::for_user("ingestion", Some(1_640_692_800_000)).unwrap()
    }

    fn users_table() -> TablePlan {
        TablePlan::new(DatasetRef::new("hive", "social_db.users", "PROD"))
            .with_raw_schema("__insert raw schema here__")
            .with_field(FieldSpec::new("user_id", FieldType::Number, "integer", "id"))
            .with_field(FieldSpec::new("email", FieldType::String, "VARCHAR(100)", "email"))
    }

    #[test]
    fn test_schema_name_defaults_to_short_name() {
        let mut table = users_table();
        assert_eq!(table.schema_name(), "users");
        table.schema_name = Some("app_users".into());
        assert_eq!(table.schema_name(), "app_users");
    }

    #[test]
    fn test_table_schema() {
        let schema = users_table().schema(&audit()).unwrap();
        assert_eq!(schema.schema_name, "users");
        assert_eq!(schema.platform.as_str(), "urn:li:dataPlatform:hive");
        assert_eq!(schema.version, 0);
        assert_eq!(schema.hash, "");
        assert_eq!(schema.field_paths().collect::<Vec<_>>(), vec!["user_id", "email"]);
        assert_eq!(schema.last_modified.time, 1_640_692_800_000);
    }

    #[test]
    fn test_proposal_order() {
        let job = JobRef::new("spark", "social_warehouse", "join", "PROD");
        let plan = Plan::new("t")
            .with_flow(FlowPlan::new(job.flow(), "Flow"))
            .with_job(
                JobPlan::new(job)
                    .with_input(DatasetRef::new("hive", "social_db.users", "PROD"))
                    .with_output(DatasetRef::new("hive", "social_db.joined", "PROD")),
            )
            .with_table(users_table());

        let proposals = plan.proposals(&audit()).unwrap();
        let names: Vec<_> = proposals.iter().map(|p| p.aspect_name()).collect();
        assert_eq!(
            names,
            vec![
                aspect::SCHEMA_METADATA,
                aspect::DATA_JOB_INPUT_OUTPUT,
                aspect::DATA_FLOW_INFO
            ]
        );
        assert_eq!(plan.proposal_count(), 3);
    }

    #[test]
    fn test_bad_attribute_names_location() {
        let plan = Plan::new("t")
            .with_table(users_table())
            .with_job(JobPlan::new(JobRef::new("spark", "f", "j", "PROD")).with_input(
                DatasetRef::new("", "social_db.users", "PROD"),
            ));

        match plan.proposals(&audit()) {
            Err(WorkflowError::InvalidArgument { context, source }) => {
                assert_eq!(context, "job #1 (j)");
                assert_eq!(source, ArgumentError::MissingAttribute("platform"));
            }
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_flow_info_description() {
        let flow_ref = FlowRef::new("spark", "social_warehouse", "prod");
        let flow = FlowPlan::new(flow_ref, "Social Warehouse");
        assert_eq!(flow.info().description, None);
        let flow = flow.with_description("Social Warehouse for the Social Network Airflow Job");
        assert_eq!(
            flow.info().description.as_deref(),
            Some("Social Warehouse for the Social Network Airflow Job")
        );
    }

    #[test]
    fn test_table_yaml_shape() {
        let yaml = r#"
platform: hive
name: social_db.checkins
env: PROD
fields:
  - path: checkin_id
    type: number
    native_type: integer
  - path: date_checked_in
    native_type: DATE
"#;
        let table: TablePlan = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(table.dataset, DatasetRef::new("hive", "social_db.checkins", "PROD"));
        assert_eq!(table.fields[0].field_type, Some(FieldType::Number));
        assert_eq!(table.fields[1].field_type, None);
        assert_eq!(table.fields[1].resolved_type(), FieldType::Date);
    }
}
