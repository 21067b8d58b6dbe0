use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sensor_analytics::config::{Config, DEFAULT_CONFIG_PATH};
use sensor_analytics::dashboard::Dashboard;
use sensor_analytics::logging;
use sensor_analytics::pipeline::IngestionPipeline;
use sensor_analytics::server::{self, AppState};
use sensor_analytics::views::AnalysisSelector;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "sensor-analytics")]
#[command(about = "Sensor data analytics for accelerometer readings")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file (optional)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch readings once and print the table, summary and one analysis
    Show {
        /// Source API URL. Falls back to source.api_url / SENSOR_API_URL
        #[arg(long)]
        api: Option<String>,
        /// Analysis to run: overview, bump or pothole
        #[arg(long, default_value_t = AnalysisSelector::Overview)]
        view: AnalysisSelector,
        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
        /// Table rows to print in text mode
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Serve the analytics over HTTP
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn show(
    config: &Config,
    api: Option<String>,
    view: AnalysisSelector,
    json: bool,
    limit: usize,
) -> Result<ExitCode> {
    let pipeline = IngestionPipeline::from_config(&config.source)?;
    let source = api.or_else(|| config.source.api_url.clone());

    let dashboard = match Dashboard::load(&pipeline, source.as_deref()) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            error!(kind = e.kind(), "Fetch failed");
            eprintln!("❌ {}", e.user_message());
            return Ok(ExitCode::FAILURE);
        }
    };

    info!(
        source = dashboard.source(),
        rows = dashboard.table().len(),
        view = %view,
        "Rendering report"
    );
    let report = dashboard.report(view);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_text(limit));
    }
    Ok(ExitCode::SUCCESS)
}

fn serve(config: &Config, port: Option<u16>) -> Result<ExitCode> {
    let mut server_config = config.server.clone();
    if let Some(port) = port {
        server_config.port = port;
    }
    sensor_analytics::metrics::init_metrics();

    let state = AppState::from_config(&config.source);
    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    runtime
        .block_on(server::start_server(&server_config, state))
        .map_err(|e| anyhow::anyhow!("Server failed: {e}"))?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    // Keep the guard alive so file logs are flushed on exit
    let _guard = logging::init_logging(&config.logging.dir);

    match cli.command {
        Commands::Show { api, view, json, limit } => show(&config, api, view, json, limit),
        Commands::Serve { port } => serve(&config, port),
    }
}
