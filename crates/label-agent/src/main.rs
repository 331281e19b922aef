use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use infrastructure::AgentConfig;
use label_agent::agent::{Agent, log_filter};
use label_agent::cli::Args;
use label_agent::commands;

async fn run() -> Result<()> {
    dotenv().ok();

    let args = Args::parse();

    // 1. Load Configuration
    let config = AgentConfig::load(&args.config_dir)
        .with_context(|| format!("Failed to load configuration from {}", args.config_dir))?;

    // 2. Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_filter(&config.logging)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🏷️ Label Agent Starting...");
    info!("📂 Config directory: {}", args.config_dir);

    // 3. Shutdown Signal
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => signal_token.cancel(),
            Err(err) => warn!(error = %err, "Unable to listen for shutdown signal"),
        }
    });

    // 4. Wire the session and run the command
    let agent = Agent::connect(&config, args.dry_run).await;
    let mut stdout = std::io::stdout();
    let result = commands::execute(agent.session(), &config, args.command, shutdown, &mut stdout).await;

    // The session is always closed, even when the command failed
    agent.shutdown().await;
    result
}

fn main() {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("❌ Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(run()) {
        eprintln!("\n❌ CRITICAL ERROR: {:?}", e);
        std::process::exit(1);
    }
}
