use anyhow::{anyhow, Context, Result};
use std::path::Path;
use stx_router::config::{AppConfig, RoutingSettings};
use stx_router::eligibility;
use stx_router::state::StateSnapshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal stx-router error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("load configuration from environment")?;
    let settings = config
        .routing_settings()
        .context("resolve routing settings")?;

    let snapshot = match &config.snapshot_path {
        Some(path) => read_snapshot(path)?,
        None => {
            warn!("STX__SNAPSHOT_PATH not provided; inspecting default state");
            StateSnapshot::default()
        }
    };

    report(&snapshot, &settings);

    match &config.relay_endpoint {
        Some(endpoint) => info!(relay = %endpoint, "relay endpoint configured"),
        None => warn!("relay endpoint not provided"),
    }
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<StateSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read state snapshot {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse state snapshot {}", path.display()))
}

fn report(snapshot: &StateSnapshot, settings: &RoutingSettings) {
    let chain_id = snapshot.chain_id();
    match eligibility::evaluate(snapshot, settings) {
        Ok(()) => info!(chain_id = %chain_id, "smart transactions enabled"),
        Err(reason) => info!(chain_id = %chain_id, reason = %reason, "smart transactions disabled"),
    }
    info!(
        chain_id = %chain_id,
        opted_in = snapshot.opt_in,
        should_use = eligibility::should_use(snapshot, settings),
        "routing decision"
    );

    for stx in eligibility::transactions_for_current_chain(snapshot) {
        info!(id = %stx.id, status = ?stx.status, uuid = ?stx.uuid, "stored smart transaction");
    }
}

fn init_tracing() -> Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
