use std::path::PathBuf;

use anyhow::Context;
use aqi_level::{compose_post_text, summarize};
use aqisrv::config::AqiSrvConfig;
use aqisrv::{create_app_state, create_routes, run_configured};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the cron trigger endpoint (default)
    Serve,

    /// Run the job once and print the outcome
    RunOnce {
        /// Decide but do not post
        #[arg(long)]
        dry_run: bool,
    },

    /// Classify a value and print the post it would produce
    Classify {
        /// AQI value (or PM2.5 concentration with `sensor.reading_scale: pm25`)
        value: f64,
    },

    /// Print the effective configuration, secrets omitted
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config =
        AqiSrvConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    let _log_guard =
        common::logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::RunOnce { dry_run } => run_once(config, dry_run).await,
        Commands::Classify { value } => {
            classify(&config, value);
            Ok(())
        },
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        },
    }
}

async fn serve(config: AqiSrvConfig) -> anyhow::Result<()> {
    let addr = config.bind_address();
    if config.cron_secret().is_none() {
        tracing::warn!("No cron secret configured; every trigger will be rejected");
    }

    let state = create_app_state(config)?;
    let app = create_routes(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("aqisrv listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(common::shutdown::wait_for_shutdown())
        .await?;

    info!("aqisrv stopped");
    Ok(())
}

async fn run_once(config: AqiSrvConfig, dry_run: bool) -> anyhow::Result<()> {
    let http = aqisrv::app::build_http_client(&config)?;
    let outcome = run_configured(&config, &http, dry_run, Utc::now()).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn classify(config: &AqiSrvConfig, value: f64) {
    let aqi = config.sensor.reading_scale.to_aqi(value);
    let summary = summarize(aqi);
    println!("{} {} (display {})", summary.emoji, summary.label, summary.display_aqi);
    println!("{}", compose_post_text(&summary, &config.publish.location));
}
