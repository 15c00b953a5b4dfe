//! Entity urns.
//!
//! Every builder here is a pure function of its attributes: the same tuple
//! always yields byte-identical output, and the `urn:li:<kind>:` prefix keeps
//! urns of different entity kinds apart. Values are used verbatim. Callers
//! supply canonical case and whitespace.
//!
//! | kind          | template                                                        |
//! |---------------|-----------------------------------------------------------------|
//! | data platform | `urn:li:dataPlatform:<platform>`                                |
//! | dataset       | `urn:li:dataset:(urn:li:dataPlatform:<platform>,<name>,<env>)`  |
//! | data flow     | `urn:li:dataFlow:(<orchestrator>,<flow_id>,<cluster>)`          |
//! | data job      | `urn:li:dataJob:(<data flow urn>,<job_id>)`                     |
//! | corp user     | `urn:li:corpuser:<username>`                                    |

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ArgumentError;

pub const URN_PREFIX: &str = "urn:li:";
const DATA_PLATFORM_PREFIX: &str = "urn:li:dataPlatform:";
const CORP_USER_PREFIX: &str = "urn:li:corpuser:";

/// Entity kinds this crate can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    #[serde(rename = "dataset")]
    Dataset,
    #[serde(rename = "dataFlow")]
    DataFlow,
    #[serde(rename = "dataJob")]
    DataJob,
    #[serde(rename = "dataPlatform")]
    DataPlatform,
    #[serde(rename = "corpuser")]
    CorpUser,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dataset => "dataset",
            Self::DataFlow => "dataFlow",
            Self::DataJob => "dataJob",
            Self::DataPlatform => "dataPlatform",
            Self::CorpUser => "corpuser",
        }
    }

    fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "dataset" => Some(Self::Dataset),
            "dataFlow" => Some(Self::DataFlow),
            "dataJob" => Some(Self::DataJob),
            "dataPlatform" => Some(Self::DataPlatform),
            "corpuser" => Some(Self::CorpUser),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stable string key naming one catalog entity.
///
/// Always well-formed: the only ways to obtain one are the builders below
/// and [`Urn::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Urn {
    entity_type: EntityType,
    value: String,
}

impl Urn {
    /// Classify an existing urn string.
    pub fn parse(value: impl Into<String>) -> Result<Self, ArgumentError> {
        let value = value.into();
        let entity_type = value
            .strip_prefix(URN_PREFIX)
            .and_then(|rest| rest.split_once(':'))
            .filter(|(_, key)| !key.is_empty())
            .and_then(|(kind, _)| EntityType::from_kind(kind))
            .ok_or_else(|| ArgumentError::MalformedUrn(value.clone()))?;
        Ok(Self { entity_type, value })
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }

    fn built(entity_type: EntityType, value: String) -> Self {
        Self { entity_type, value }
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for Urn {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl FromStr for Urn {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Urn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de> Deserialize<'de> for Urn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Urn::parse(value).map_err(serde::de::Error::custom)
    }
}

fn require(attribute: &'static str, value: &str) -> Result<(), ArgumentError> {
    if value.is_empty() {
        Err(ArgumentError::MissingAttribute(attribute))
    } else {
        Ok(())
    }
}

// ============================================================================
// BUILDERS
// ============================================================================

/// Accepts either a bare platform name (`hive`) or a platform urn.
pub fn data_platform_urn(platform: &str) -> Result<Urn, ArgumentError> {
    if let Some(name) = platform.strip_prefix(DATA_PLATFORM_PREFIX) {
        require("platform", name)?;
        return Ok(Urn::built(EntityType::DataPlatform, platform.to_string()));
    }
    require("platform", platform)?;
    Ok(Urn::built(
        EntityType::DataPlatform,
        format!("{DATA_PLATFORM_PREFIX}{platform}"),
    ))
}

pub fn dataset_urn(platform: &str, name: &str, env: &str) -> Result<Urn, ArgumentError> {
    let platform = data_platform_urn(platform)?;
    require("name", name)?;
    require("env", env)?;
    Ok(Urn::built(
        EntityType::Dataset,
        format!("urn:li:dataset:({platform},{name},{env})"),
    ))
}

pub fn data_flow_urn(
    orchestrator: &str,
    flow_id: &str,
    cluster: &str,
) -> Result<Urn, ArgumentError> {
    require("orchestrator", orchestrator)?;
    require("flow_id", flow_id)?;
    require("cluster", cluster)?;
    Ok(Urn::built(
        EntityType::DataFlow,
        format!("urn:li:dataFlow:({orchestrator},{flow_id},{cluster})"),
    ))
}

pub fn data_job_urn(
    orchestrator: &str,
    flow_id: &str,
    job_id: &str,
    cluster: &str,
) -> Result<Urn, ArgumentError> {
    let flow = data_flow_urn(orchestrator, flow_id, cluster)?;
    require("job_id", job_id)?;
    Ok(Urn::built(
        EntityType::DataJob,
        format!("urn:li:dataJob:({flow},{job_id})"),
    ))
}

/// Accepts either a bare username or a corp-user urn.
pub fn corp_user_urn(username: &str) -> Result<Urn, ArgumentError> {
    if let Some(name) = username.strip_prefix(CORP_USER_PREFIX) {
        require("username", name)?;
        return Ok(Urn::built(EntityType::CorpUser, username.to_string()));
    }
    require("username", username)?;
    Ok(Urn::built(
        EntityType::CorpUser,
        format!("{CORP_USER_PREFIX}{username}"),
    ))
}

// ============================================================================
// ATTRIBUTE TUPLES
// ============================================================================

/// Attributes naming one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetRef {
    pub platform: String,
    pub name: String,
    pub env: String,
}

impl DatasetRef {
    pub fn new(
        platform: impl Into<String>,
        name: impl Into<String>,
        env: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            name: name.into(),
            env: env.into(),
        }
    }

    pub fn urn(&self) -> Result<Urn, ArgumentError> {
        dataset_urn(&self.platform, &self.name, &self.env)
    }

    /// Last dotted segment of the name (`social_db.users` -> `users`).
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// Attributes naming one data flow (pipeline).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowRef {
    pub orchestrator: String,
    pub flow_id: String,
    pub cluster: String,
}

impl FlowRef {
    pub fn new(
        orchestrator: impl Into<String>,
        flow_id: impl Into<String>,
        cluster: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator: orchestrator.into(),
            flow_id: flow_id.into(),
            cluster: cluster.into(),
        }
    }

    pub fn urn(&self) -> Result<Urn, ArgumentError> {
        data_flow_urn(&self.orchestrator, &self.flow_id, &self.cluster)
    }
}

/// Attributes naming one data job inside a flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobRef {
    pub orchestrator: String,
    pub flow_id: String,
    pub job_id: String,
    pub cluster: String,
}

impl JobRef {
    pub fn new(
        orchestrator: impl Into<String>,
        flow_id: impl Into<String>,
        job_id: impl Into<String>,
        cluster: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator: orchestrator.into(),
            flow_id: flow_id.into(),
            job_id: job_id.into(),
            cluster: cluster.into(),
        }
    }

    pub fn urn(&self) -> Result<Urn, ArgumentError> {
        data_job_urn(&self.orchestrator, &self.flow_id, &self.job_id, &self.cluster)
    }

    /// The flow this job belongs to.
    pub fn flow(&self) -> FlowRef {
        FlowRef::new(&self.orchestrator, &self.flow_id, &self.cluster)
    }
}


// ============================================================================
// Property tests
// ============================================================================
