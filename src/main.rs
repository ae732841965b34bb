//! Entry point. Wires config -> simulator -> run summary file.

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use directories::ProjectDirs;
use dotenvy::dotenv;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use swing_options::config::AppConfig;
use swing_options::report::RunReport;
use swing_options::sim::Simulator;
use swing_options::sink::TracingSink;

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cfg_path = std::env::var("SIM_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let cfg = AppConfig::load_or_default(&cfg_path)?;
    info!(
        "Simulator started. Symbols={:?}, Seed={:?}, Direction={:?}, Lots={}, Fee={}",
        cfg.symbols, cfg.seed, cfg.direction, cfg.lot_size.fixed_lots, cfg.fees.per_trade_fee
    );

    let mut sim = Simulator::new(cfg, TracingSink::shared("sim"))?;
    let summary = sim.run();
    info!(
        "Simulation summary: {}",
        serde_json::to_string(&summary).context("serialize summary")?
    );

    let report = RunReport::new(Utc::now(), Some(cfg_path), sim.ledger());
    let out_dir = output_dir();
    match report.write_to(&out_dir) {
        Ok(path) => info!("Wrote {}", path.display()),
        Err(e) => error!("summary write failed: {:#}", e),
    }
    Ok(())
}

/// `SIM_OUT_DIR`, else `./out` when present, else the platform data dir.
fn output_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SIM_OUT_DIR") {
        return PathBuf::from(dir);
    }
    let local = PathBuf::from("out");
    if local.is_dir() {
        return local;
    }
    ProjectDirs::from("", "", "swing-options")
        .map(|d| d.data_dir().join("out"))
        .unwrap_or(local)
}
