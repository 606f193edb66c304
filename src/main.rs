//! Admission gate.
//!
//! Makes an allow/deny decision for every inbound client IP before traffic
//! reaches the protected application.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                 ADMISSION GATE                   │
//!                     │                                                  │
//!   HTTP / TCP        │  ┌────────────┐      ┌────────────────────────┐  │
//!   dispatcher  ──────┼─▶│ middleware │─────▶│    AdmissionEngine     │  │
//!   (external)        │  │ conn guard │      │ blacklist → geo → rate │  │
//!                     │  └────────────┘      └───────────┬────────────┘  │
//!                     │                                  │               │
//!                     │         ┌────────────────────────┼──────┐        │
//!                     │         ▼                        ▼      ▼        │
//!                     │  ┌─────────────┐   ┌──────────────┐ ┌────────┐   │
//!                     │  │ geo lookup  │   │ expiry sweep │ │ admin  │   │
//!                     │  │  (MaxMind)  │   │  (10s tick)  │ │  API   │   │
//!                     │  └─────────────┘   └──────────────┘ └────────┘   │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use admission_gate::config::{load_config, GateConfig};
use admission_gate::lifecycle::startup;
use admission_gate::observability::logging;

#[derive(Parser)]
#[command(name = "admission-gate")]
#[command(about = "Per-IP and per-country admission control", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    logging::init_tracing(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "admission-gate starting"
    );

    startup::run(config).await?;
    Ok(())
}
