//! adlaunch: bulk ad generation and sequential submission.
//!
//! `serve` runs the HTTP service, `preview` expands a plan offline and
//! `submit` runs one bulk submission from the command line.

use adlaunch_api::{ApiServer, AppState};
use adlaunch_core::config::AppConfig;
use adlaunch_core::records::{AdRecordSink, DiscardRecords};
use adlaunch_graph::{AdPlatformClient, GraphApiClient, InMemoryPlatform};
use adlaunch_pipeline::{BulkSubmission, BulkSubmissionRequest, EngineSettings};
use adlaunch_store::HttpRecordSink;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "adlaunch")]
#[command(about = "Generate ad permutations and submit them to the ads platform")]
#[command(version)]
struct Cli {
    /// Ad account id (overrides config)
    #[arg(long, global = true, env = "ADLAUNCH__PLATFORM__AD_ACCOUNT_ID")]
    ad_account_id: Option<String>,

    /// Use the in-memory platform instead of the Graph API
    #[arg(long, global = true, default_value_t = false)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP service
    Serve {
        /// HTTP port (overrides config)
        #[arg(long, env = "ADLAUNCH__API__HTTP_PORT")]
        http_port: Option<u16>,
    },

    /// Print the ad specifications a plan expands to
    Preview {
        /// Path to a bulk submission plan (JSON)
        #[arg(short, long)]
        plan: PathBuf,
    },

    /// Run a bulk submission
    Submit {
        /// Path to a bulk submission plan (JSON)
        #[arg(short, long)]
        plan: PathBuf,

        /// Forward local ad records to a running adlaunch service
        #[arg(long)]
        records_url: Option<String>,
    },
}

fn load_plan(path: &Path) -> anyhow::Result<BulkSubmissionRequest> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading plan {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing plan {}", path.display()))
}

fn build_client(config: &AppConfig, dry_run: bool) -> anyhow::Result<Arc<dyn AdPlatformClient>> {
    if dry_run {
        info!("Dry run: using the in-memory platform");
        return Ok(Arc::new(InMemoryPlatform::new()));
    }
    if config.platform.access_token.trim().is_empty() {
        anyhow::bail!("platform access token is not configured (ADLAUNCH__PLATFORM__ACCESS_TOKEN)");
    }
    if config.platform.ad_account_id.trim().is_empty() {
        anyhow::bail!("ad account id is not configured (ADLAUNCH__PLATFORM__AD_ACCOUNT_ID)");
    }
    Ok(Arc::new(GraphApiClient::new(&config.platform)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adlaunch=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(account) = cli.ad_account_id {
        config.platform.ad_account_id = account;
    }

    match cli.command {
        Commands::Serve { http_port } => {
            if let Some(port) = http_port {
                config.api.http_port = port;
            }
            serve(config, cli.dry_run).await
        }
        Commands::Preview { plan } => preview(&plan),
        Commands::Submit { plan, records_url } => submit(config, &plan, records_url, cli.dry_run).await,
    }
}

async fn serve(config: AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let client = build_client(&config, dry_run)?;
    let settings = EngineSettings::from_config(&config.pipeline)?;
    info!(
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        platform = client.platform_name(),
        "Configuration loaded"
    );

    let server = ApiServer::new(config, AppState::new(client, settings));
    if let Err(e) = server.start_metrics() {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("adlaunch is ready to serve traffic");
    server.start_http().await
}

fn preview(plan: &Path) -> anyhow::Result<()> {
    let request = load_plan(plan)?;
    let specs = request.prepare()?;
    info!(total = specs.len(), "Plan expanded");
    println!("{}", serde_json::to_string_pretty(&specs)?);
    Ok(())
}

async fn submit(
    config: AppConfig,
    plan: &Path,
    records_url: Option<String>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let request = load_plan(plan)?;
    let specs = request.prepare()?;
    let client = build_client(&config, dry_run)?;
    let settings = EngineSettings::from_config(&config.pipeline)?;
    let records: Arc<dyn AdRecordSink> = match records_url {
        Some(url) => Arc::new(HttpRecordSink::new(&url)?),
        None => Arc::new(DiscardRecords),
    };

    let submission = BulkSubmission::new(client, records, settings);
    let mut progress = submission.subscribe();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let snapshot = progress.borrow_and_update().clone();
            info!(
                completed = snapshot.completed_count,
                total = snapshot.total_count,
                status = %snapshot.current_status_text,
                "Progress"
            );
        }
    });

    let outcome = submission
        .run(&specs, &request.media, &request.parents, &request.template)
        .await;
    drop(submission);
    let _ = watcher.await;

    let report = outcome?;
    println!("{}", serde_json::to_string_pretty(&report.summary)?);
    if report.summary.failure_count > 0 {
        warn!(
            failed = report.summary.failure_count,
            succeeded = report.summary.success_count,
            "Some ads were not created"
        );
    }
    Ok(())
}
