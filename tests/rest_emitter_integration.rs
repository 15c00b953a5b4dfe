//! Integration test: REST emitter against a local stand-in catalog
//!
//! Starts an axum server on an ephemeral port that records every
//! ingestProposal call, then drives the emitter and the workflow at it.
//!
//! Run:
//! ```bash
//! cargo test --test rest_emitter_integration
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use catalog_client::{Emitter, EmitterConfig, RestEmitter};
use catalog_emit::plan::builtin;
use catalog_emit::{Workflow, WorkflowError};
use catalog_types::{aspect, AuditContext, ChangeProposal, DataFlowInfo, EmitError, FlowRef};

#[derive(Debug, Clone)]
struct Call {
    action: Option<String>,
    protocol: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct Catalog {
    calls: Arc<Mutex<Vec<Call>>>,
    status: StatusCode,
}

async fn ingest(
    State(catalog): State<Catalog>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let protocol = headers
        .get("x-restli-protocol-version")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    catalog.calls.lock().unwrap().push(Call {
        action: query.get("action").cloned(),
        protocol,
        body,
    });

    if catalog.status.is_success() {
        (catalog.status, Json(json!({ "value": "ok" })))
    } else {
        (
            catalog.status,
            Json(json!({ "message": "aspect failed validation" })),
        )
    }
}

async fn config() -> Json<Value> {
    Json(json!({ "noCode": "true" }))
}

async fn start(status: StatusCode) -> (SocketAddr, Catalog) {
    let catalog = Catalog {
        calls: Arc::new(Mutex::new(Vec::new())),
        status,
    };
    let app = Router::new()
        .route("/aspects", post(ingest))
        .route("/config", get(config))
        .with_state(catalog.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, catalog)
}

fn emitter_for(addr: SocketAddr) -> RestEmitter {
    RestEmitter::new(
        &EmitterConfig::default()
            .with_gms_url(format!("http://{addr}"))
            .with_timeout_secs(5),
    )
    .unwrap()
}

fn flow_proposal() -> ChangeProposal {
    let urn = FlowRef::new("spark", "social_warehouse", "prod").urn().unwrap();
    ChangeProposal::upsert(
        urn,
        DataFlowInfo::new("Social Warehouse")
            .with_description("Social Warehouse for the Social Network Airflow Job"),
    )
    .unwrap()
}

#[tokio::test]
async fn posts_ingest_proposal_envelope() {
    let (addr, catalog) = start(StatusCode::OK).await;
    emitter_for(addr).emit(&flow_proposal()).await.unwrap();

    let calls = catalog.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.action.as_deref(), Some("ingestProposal"));
    assert_eq!(call.protocol.as_deref(), Some("2.0.0"));

    let proposal = &call.body["proposal"];
    assert_eq!(proposal["entityType"], "dataFlow");
    assert_eq!(
        proposal["entityUrn"],
        "urn:li:dataFlow:(spark,social_warehouse,prod)"
    );
    assert_eq!(proposal["changeType"], "UPSERT");
    assert_eq!(proposal["aspectName"], "dataFlowInfo");

    let value: Value =
        serde_json::from_str(proposal["aspect"]["value"].as_str().unwrap()).unwrap();
    assert_eq!(
        value,
        json!({
            "name": "Social Warehouse",
            "description": "Social Warehouse for the Social Network Airflow Job"
        })
    );
}

#[tokio::test]
async fn client_error_is_validation() {
    let (addr, _catalog) = start(StatusCode::UNPROCESSABLE_ENTITY).await;
    let err = emitter_for(addr).emit(&flow_proposal()).await.unwrap_err();

    match err {
        EmitError::Validation { status, message } => {
            assert_eq!(status, 422);
            assert!(message.contains("aspect failed validation"));
        }
        other => panic!("expected Validation, got {other}"),
    }
}

#[tokio::test]
async fn server_error_is_transport() {
    let (addr, _catalog) = start(StatusCode::SERVICE_UNAVAILABLE).await;
    let err = emitter_for(addr).emit(&flow_proposal()).await.unwrap_err();
    assert!(matches!(err, EmitError::Transport(_)), "got {err}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_connection_hits_config_endpoint() {
    let (addr, _catalog) = start(StatusCode::OK).await;
    emitter_for(addr).test_connection().await.unwrap();
}

#[tokio::test]
async fn hospital_plan_sends_one_lineage_call() {
    let (addr, catalog) = start(StatusCode::OK).await;
    let emitter = emitter_for(addr);
    let plan = builtin("hospital").unwrap();
    let audit = AuditContext::for_user("ingestion", Some(1_640_692_800_000)).unwrap();

    let report = Workflow::new(&emitter, audit).run(&plan).await.unwrap();
    assert_eq!(report.emitted.len(), 1);

    let calls = catalog.calls.lock().unwrap().clone();
    let proposal = &calls[0].body["proposal"];
    assert_eq!(proposal["aspectName"], aspect::DATA_JOB_INPUT_OUTPUT);
    let flow = "urn:li:dataFlow:(airflow,hospitaldb_ingestion_flow,PROD)";
    assert_eq!(proposal["entityUrn"], format!("urn:li:dataJob:({flow},hospitaldb_ingestion_job)"));

    let lineage: Value =
        serde_json::from_str(proposal["aspect"]["value"].as_str().unwrap()).unwrap();
    assert_eq!(lineage["inputDatasets"].as_array().unwrap().len(), 4);
    assert_eq!(
        lineage["outputDatasets"][0],
        "urn:li:dataset:(urn:li:dataPlatform:snowflake,landing.hospitaldb.doctor,PROD)"
    );
}

#[tokio::test]
async fn rejected_schema_stops_social_run() {
    let (addr, catalog) = start(StatusCode::BAD_REQUEST).await;
    let emitter = emitter_for(addr);
    let plan = builtin("social").unwrap();
    let audit = AuditContext::for_user("ingestion", Some(1_640_692_800_000)).unwrap();

    let err = Workflow::new(&emitter, audit).run(&plan).await.unwrap_err();
    let (urn, aspect_name) = err.failed_pair().unwrap();
    assert_eq!(
        urn.as_str(),
        "urn:li:dataset:(urn:li:dataPlatform:hive,social_db.users,PROD)"
    );
    assert_eq!(aspect_name, aspect::SCHEMA_METADATA);
    assert!(matches!(err, WorkflowError::Emit { .. }));
    assert_eq!(catalog.calls.lock().unwrap().len(), 1);
}
