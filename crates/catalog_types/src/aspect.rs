//! Aspects: typed bundles of metadata attached to one entity.
//!
//! Serialized field names follow the catalog's own vocabulary
//! (`fieldPath`, `nativeDataType`, `inputDatasets`, ...) so an aspect can be
//! handed to the catalog unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::audit::{AuditContext, AuditStamp};
use crate::error::ArgumentError;
use crate::urn::{data_platform_urn, EntityType, Urn};

pub const SCHEMA_METADATA: &str = "schemaMetadata";
pub const DATA_JOB_INPUT_OUTPUT: &str = "dataJobInputOutput";
pub const DATA_FLOW_INFO: &str = "dataFlowInfo";

// ============================================================================
// FIELD TYPES
// ============================================================================

/// Semantic type tag of a schema field.
///
/// `Other` covers every native type without a clean mapping; the native
/// label on the field is what downstream readers interpret in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Date,
    Other,
}

impl FieldType {
    /// Best-effort mapping from a source-native type label.
    pub fn infer(native_type: &str) -> Self {
        let base = native_type
            .trim()
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match base.as_str() {
            "int" | "integer" | "bigint" | "smallint" | "tinyint" | "decimal" | "numeric"
            | "number" | "float" | "double" | "real" => Self::Number,
            "varchar" | "nvarchar" | "char" | "nchar" | "character" | "text" | "string" => {
                Self::String
            }
            "date" | "datetime" | "timestamp" | "timestamptz" | "time" => Self::Date,
            _ => Self::Other,
        }
    }

    fn wire_name(self) -> &'static str {
        match self {
            Self::String => "com.linkedin.schema.StringType",
            Self::Number => "com.linkedin.schema.NumberType",
            Self::Date => "com.linkedin.schema.DateType",
            Self::Other => "com.linkedin.schema.NullType",
        }
    }

    fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "com.linkedin.schema.StringType" => Some(Self::String),
            "com.linkedin.schema.NumberType" => Some(Self::Number),
            "com.linkedin.schema.DateType" => Some(Self::Date),
            other if other.starts_with("com.linkedin.schema.") => Some(Self::Other),
            _ => None,
        }
    }
}

/// `{"type": {"com.linkedin.schema.NumberType": {}}}` on the wire.
mod field_type_wire {
    use super::FieldType;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::{Map, Value};
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize)]
    struct Repr {
        #[serde(rename = "type")]
        kind: BTreeMap<String, Map<String, Value>>,
    }

    pub fn serialize<S: Serializer>(
        field_type: &FieldType,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut kind = BTreeMap::new();
        kind.insert(field_type.wire_name().to_string(), Map::new());
        Repr { kind }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FieldType, D::Error> {
        let repr = Repr::deserialize(deserializer)?;
        let name = repr
            .kind
            .keys()
            .next()
            .ok_or_else(|| de::Error::custom("empty field type"))?;
        FieldType::from_wire_name(name)
            .ok_or_else(|| de::Error::custom(format!("unknown field type {name}")))
    }
}

// ============================================================================
// SCHEMA METADATA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformSchema {
    #[serde(rename = "com.linkedin.schema.OtherSchema")]
    Other {
        #[serde(rename = "rawSchema")]
        raw_schema: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    pub field_path: String,
    #[serde(rename = "type", with = "field_type_wire")]
    pub field_type: FieldType,
    pub native_data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<AuditStamp>,
}

/// Caller-facing description of one field, before stamping.
///
/// `field_type` may be left out, in which case it is inferred from the
/// native type label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub path: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    pub native_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub nullable: bool,
}

impl FieldSpec {
    pub fn new(
        path: impl Into<String>,
        field_type: FieldType,
        native_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            field_type: Some(field_type),
            native_type: native_type.into(),
            description: Some(description.into()),
            nullable: false,
        }
    }

    pub fn inferred(path: impl Into<String>, native_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            field_type: None,
            native_type: native_type.into(),
            description: None,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn resolved_type(&self) -> FieldType {
        self.field_type
            .unwrap_or_else(|| FieldType::infer(&self.native_type))
    }

    fn into_field(self, stamp: &AuditStamp) -> SchemaField {
        SchemaField {
            field_type: self.resolved_type(),
            field_path: self.path,
            native_data_type: self.native_type,
            description: self.description,
            nullable: self.nullable,
            last_modified: Some(stamp.clone()),
        }
    }
}

/// Structure of one dataset. Re-submission replaces the whole field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaMetadata {
    pub schema_name: String,
    pub platform: Urn,
    pub version: i64,
    pub hash: String,
    pub platform_schema: PlatformSchema,
    pub last_modified: AuditStamp,
    pub fields: Vec<SchemaField>,
}

impl SchemaMetadata {
    pub fn field_paths(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field_path.as_str())
    }

    pub fn field(&self, path: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.field_path == path)
    }

    /// Paths that occur more than once, each reported once, in order of
    /// their second occurrence. Duplicates are kept in `fields` as given.
    pub fn duplicate_paths(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut dups = Vec::new();
        for path in self.field_paths() {
            if !seen.insert(path) && reported.insert(path) {
                dups.push(path);
            }
        }
        dups
    }
}

pub struct SchemaMetadataBuilder {
    schema_name: String,
    platform: String,
    version: i64,
    hash: String,
    raw_schema: String,
    fields: Vec<FieldSpec>,
}

impl SchemaMetadataBuilder {
    /// `platform` may be a bare name or a platform urn.
    pub fn new(schema_name: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            platform: platform.into(),
            version: 0,
            hash: String::new(),
            raw_schema: String::new(),
            fields: Vec::new(),
        }
    }

    /// Source-system schema version; 0 when the source has none.
    pub fn version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    pub fn raw_schema(mut self, raw_schema: impl Into<String>) -> Self {
        self.raw_schema = raw_schema.into();
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn build(self, audit: &AuditContext) -> Result<SchemaMetadata, ArgumentError> {
        let platform = data_platform_urn(&self.platform)?;
        let stamp = audit.stamp();
        let fields = self
            .fields
            .into_iter()
            .map(|f| f.into_field(&stamp))
            .collect();

        Ok(SchemaMetadata {
            schema_name: self.schema_name,
            platform,
            version: self.version,
            hash: self.hash,
            platform_schema: PlatformSchema::Other {
                raw_schema: self.raw_schema,
            },
            last_modified: stamp,
            fields,
        })
    }
}

// ============================================================================
// LINEAGE
// ============================================================================

/// Inputs and outputs of one data job. Order is kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataJobInputOutput {
    pub input_datasets: Vec<Urn>,
    pub output_datasets: Vec<Urn>,
    #[serde(default)]
    pub input_datajobs: Vec<Urn>,
}

impl DataJobInputOutput {
    pub fn new(
        input_datasets: Vec<Urn>,
        output_datasets: Vec<Urn>,
        input_datajobs: Vec<Urn>,
    ) -> Result<Self, ArgumentError> {
        expect_kind(EntityType::Dataset, &input_datasets)?;
        expect_kind(EntityType::Dataset, &output_datasets)?;
        expect_kind(EntityType::DataJob, &input_datajobs)?;
        Ok(Self {
            input_datasets,
            output_datasets,
            input_datajobs,
        })
    }
}

fn expect_kind(expected: EntityType, urns: &[Urn]) -> Result<(), ArgumentError> {
    match urns.iter().find(|u| u.entity_type() != expected) {
        Some(urn) => Err(ArgumentError::UnexpectedEntityType {
            expected,
            urn: urn.to_string(),
        }),
        None => Ok(()),
    }
}

// ============================================================================
// FLOW INFO
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFlowInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DataFlowInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ============================================================================
// ASPECT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "aspectName", content = "value")]
pub enum Aspect {
    #[serde(rename = "schemaMetadata")]
    SchemaMetadata(SchemaMetadata),
    #[serde(rename = "dataJobInputOutput")]
    DataJobInputOutput(DataJobInputOutput),
    #[serde(rename = "dataFlowInfo")]
    DataFlowInfo(DataFlowInfo),
}

impl Aspect {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SchemaMetadata(_) => SCHEMA_METADATA,
            Self::DataJobInputOutput(_) => DATA_JOB_INPUT_OUTPUT,
            Self::DataFlowInfo(_) => DATA_FLOW_INFO,
        }
    }

    /// The only entity kind this aspect may be attached to.
    pub fn target(&self) -> EntityType {
        match self {
            Self::SchemaMetadata(_) => EntityType::Dataset,
            Self::DataJobInputOutput(_) => EntityType::DataJob,
            Self::DataFlowInfo(_) => EntityType::DataFlow,
        }
    }

    /// The aspect body alone, as a JSON document.
    pub fn value_json(&self) -> serde_json::Result<String> {
        match self {
            Self::SchemaMetadata(a) => serde_json::to_string(a),
            Self::DataJobInputOutput(a) => serde_json::to_string(a),
            Self::DataFlowInfo(a) => serde_json::to_string(a),
        }
    }
}

impl From<SchemaMetadata> for Aspect {
    fn from(value: SchemaMetadata) -> Self {
        Self::SchemaMetadata(value)
    }
}

impl From<DataJobInputOutput> for Aspect {
    fn from(value: DataJobInputOutput) -> Self {
        Self::DataJobInputOutput(value)
    }
}

impl From<DataFlowInfo> for Aspect {
    fn from(value: DataFlowInfo) -> Self {
        Self::DataFlowInfo(value)
    }
}


// ============================================================================
// Property tests
// ============================================================================
