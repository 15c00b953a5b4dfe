//! REST emitter.
//!
//! One POST to `<gms>/aspects?action=ingestProposal` per proposal. The aspect
//! travels as a JSON string inside a generic envelope. No retry, no auth:
//! a failed call is reported once and left to the caller.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;
use url::Url;

use catalog_types::{ArgumentError, ChangeProposal, ChangeType, EmitError, EntityType, Urn};

use crate::config::EmitterConfig;
use crate::{Emitter, Result};

const INGEST_PATH: &str = "aspects?action=ingestProposal";
const CONFIG_PATH: &str = "config";
const RESTLI_PROTOCOL_HEADER: &str = "x-restli-protocol-version";
const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";
const JSON_CONTENT_TYPE: &str = "application/json";
const MAX_ERROR_BODY: usize = 500;

#[derive(Serialize)]
struct IngestProposalRequest<'a> {
    proposal: ProposalEnvelope<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProposalEnvelope<'a> {
    entity_type: EntityType,
    entity_urn: &'a Urn,
    change_type: ChangeType,
    aspect_name: &'static str,
    aspect: GenericAspect,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenericAspect {
    value: String,
    content_type: &'static str,
}

pub struct RestEmitter {
    http: Client,
    base_url: Url,
    ingest_url: Url,
    headers: HeaderMap,
}

impl RestEmitter {
    pub fn new(config: &EmitterConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        let ingest_url = base_url
            .join(INGEST_PATH)
            .map_err(|_| ArgumentError::InvalidUrl(config.gms_url.clone()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            RESTLI_PROTOCOL_HEADER,
            HeaderValue::from_static(RESTLI_PROTOCOL_VERSION),
        );
        for (name, value) in &config.extra_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ArgumentError::InvalidHeader(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| ArgumentError::InvalidHeader(name.clone()))?;
            headers.insert(header_name, header_value);
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EmitError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            ingest_url,
            headers,
        })
    }

    pub fn ingest_url(&self) -> &Url {
        &self.ingest_url
    }

    /// Request body for one proposal.
    pub fn ingest_body(proposal: &ChangeProposal) -> Result<serde_json::Value> {
        let request = IngestProposalRequest {
            proposal: ProposalEnvelope {
                entity_type: proposal.entity_type,
                entity_urn: &proposal.entity_urn,
                change_type: proposal.change_type,
                aspect_name: proposal.aspect_name(),
                aspect: GenericAspect {
                    value: proposal.aspect.value_json()?,
                    content_type: JSON_CONTENT_TYPE,
                },
            },
        };
        Ok(serde_json::to_value(request)?)
    }

    /// Reachability probe against the service's config endpoint.
    pub async fn test_connection(&self) -> Result<()> {
        let url = self
            .base_url
            .join(CONFIG_PATH)
            .map_err(|_| ArgumentError::InvalidUrl(self.base_url.to_string()))?;
        let response = self
            .http
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| EmitError::Transport(e.to_string()))?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    let message: String = body.chars().take(MAX_ERROR_BODY).collect();

    if status.is_client_error() {
        Err(EmitError::Validation {
            status: status.as_u16(),
            message,
        })
    } else {
        Err(EmitError::Transport(format!("catalog returned {status}: {message}")))
    }
}

#[async_trait]
impl Emitter for RestEmitter {
    async fn emit(&self, proposal: &ChangeProposal) -> Result<()> {
        proposal.validate()?;
        let body = Self::ingest_body(proposal)?;

        debug!(
            url = %self.ingest_url,
            urn = %proposal.entity_urn,
            aspect = proposal.aspect_name(),
            "POST ingestProposal"
        );

        let response = self
            .http
            .post(self.ingest_url.clone())
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| EmitError::Transport(e.to_string()))?;

        check_status(response).await
    }

    fn describe(&self) -> String {
        format!("rest {}", self.base_url)
    }
}
