//! Catalog Emit CLI
//!
//! Loads a plan (builtin, from the plan directory, or from a file), builds
//! its schema, lineage and flow proposals, and submits them to the chosen
//! sink. Exits non-zero on the first failure.
//!
//! Usage:
//!   cargo run --bin catalog_emit                      # builtin `social` plan to the REST sink
//!   cargo run --bin catalog_emit -- hospital --gms-url http://gms:8080
//!   cargo run --bin catalog_emit -- social --sink file --out social.jsonl
//!   cargo run --bin catalog_emit -- --replay social.jsonl
//!   cargo run --bin catalog_emit -- --plan-file my_plan.yaml --sink memory --json

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use catalog_client::{file::replay, RestEmitter};
use catalog_emit::plan::{builtin_names, PlanLoader};
use catalog_emit::{Settings, SinkConfig, Workflow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Sink {
    Rest,
    File,
    Memory,
}

/// Publish dataset schemas, job lineage and flow info to a metadata catalog
#[derive(Parser, Debug)]
#[command(name = "catalog_emit")]
#[command(about = "Publish dataset schemas, job lineage and flow info to a metadata catalog")]
struct Args {
    /// Plan name: looked up in the plan directory, then among the builtin plans
    #[arg(default_value = "social")]
    plan: String,

    /// Load the plan from this YAML file instead
    #[arg(long, conflicts_with = "plan")]
    plan_file: Option<PathBuf>,

    /// Directory searched for `<plan>.yaml`
    #[arg(long, env = "CATALOG_PLAN_DIR", default_value = "config/plans")]
    plan_dir: PathBuf,

    /// Catalog base URL (overrides CATALOG_GMS_URL)
    #[arg(long)]
    gms_url: Option<String>,

    /// Per-request timeout in seconds (overrides CATALOG_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Where proposals go
    #[arg(long, value_enum, default_value_t = Sink::Rest)]
    sink: Sink,

    /// Output file for `--sink file`
    #[arg(long, default_value = "proposals.jsonl")]
    out: PathBuf,

    /// Audit time in epoch milliseconds (overrides the plan)
    #[arg(long)]
    audit_time: Option<i64>,

    /// Audit actor username (overrides CATALOG_ACTOR and the plan)
    #[arg(long)]
    actor: Option<String>,

    /// Submit a previously captured JSON-lines file instead of a plan
    #[arg(long, conflicts_with_all = ["plan", "plan_file"])]
    replay: Option<PathBuf>,

    /// Only check that the catalog is reachable
    #[arg(long)]
    check_connection: bool,

    /// List builtin plans and exit
    #[arg(long)]
    list: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn settings(&self) -> Settings {
        let mut settings = Settings::from_env();
        if let Some(url) = &self.gms_url {
            settings.emitter.gms_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            settings.emitter.timeout_secs = secs;
        }
        if let Some(actor) = &self.actor {
            settings = settings.with_actor(actor.as_str());
        }
        if let Some(millis) = self.audit_time {
            settings = settings.with_audit_time(millis);
        }
        settings.with_sink(match self.sink {
            Sink::Rest => SinkConfig::Rest,
            Sink::File => SinkConfig::File {
                path: self.out.clone(),
            },
            Sink::Memory => SinkConfig::Memory,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    if args.list {
        for name in builtin_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let settings = args.settings();

    if args.check_connection {
        let emitter = RestEmitter::new(&settings.emitter)?;
        emitter
            .test_connection()
            .await
            .with_context(|| format!("catalog at {} is not reachable", settings.emitter.gms_url))?;
        println!("catalog at {} is reachable", settings.emitter.gms_url);
        return Ok(());
    }

    let emitter = settings
        .sink
        .open(&settings.emitter)
        .await
        .context("Failed to open sink")?;

    if let Some(path) = &args.replay {
        let count = replay(path, emitter.as_ref())
            .await
            .with_context(|| format!("Failed to replay {}", path.display()))?;
        println!("replayed {count} proposals into {}", emitter.describe());
        return Ok(());
    }

    let loader = PlanLoader::new(&args.plan_dir);
    let plan = match &args.plan_file {
        Some(path) => loader.load_file(path)?,
        None => loader.load(&args.plan)?,
    };

    let audit = settings
        .audit_context(plan.audit.as_ref())
        .context("Invalid audit identity")?;
    info!(
        actor = %audit.actor(),
        time_millis = audit.time_millis(),
        "Audit context"
    );

    let report = Workflow::new(emitter.as_ref(), audit)
        .run(&plan)
        .await
        .with_context(|| format!("Run of plan '{}' failed", plan.name))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for emitted in &report.emitted {
            println!("{:<20} {}", emitted.aspect, emitted.urn);
        }
        println!(
            "\n{} proposals emitted to {} in {}ms (run {})",
            report.emitted.len(),
            report.sink,
            report.elapsed_ms,
            report.run_id
        );
    }

    Ok(())
}
