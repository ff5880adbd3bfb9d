use anyhow::Result;
use clap::Parser;
use mindsync::{AnalysisClient, Config, FixtureBackendFactory, SessionController};
use std::sync::Arc;
use tracing::info;

/// MindSync session core: voice emotion analysis session state machine
#[derive(Parser)]
#[command(name = "mindsync", version)]
struct Args {
    /// Path to a config file (built-in defaults when omitted)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    info!("MindSync session core v0.1.0");
    info!("Inference endpoint: {}", cfg.analysis.endpoint_url);
    info!("Capture deadline: {}s", cfg.capture.deadline_secs);
    info!(
        "Theme: {} colors every {}s",
        cfg.theme.palette.len(),
        cfg.theme.interval_secs
    );

    let analyzer = Arc::new(AnalysisClient::new(&cfg.analysis.endpoint_url)?);
    // No real device backend is wired in yet; the fixture keeps the
    // capture path exercisable without a microphone.
    let devices = Arc::new(FixtureBackendFactory::silent());

    let controller = SessionController::new(cfg.controller(), analyzer, devices);
    let stats = controller.stats().await;
    info!(
        "session {} mounted on {:?} page",
        stats.session_id, stats.page
    );
    info!("Ambient color: {}", controller.current_color().await);
    info!("The view layer is external; session core is ready.");

    controller.shutdown().await;
    Ok(())
}
