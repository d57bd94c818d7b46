//! Headless driver for the cache grid.
//!
//! Reads commands from stdin, one per line (see `commands` for the grammar),
//! and reports every view change and outcome through `tracing`. The session
//! ends on EOF or Ctrl-C, after a final save.
//!
//! ```text
//! cachegrid [config.toml]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use cachegrid_core::config::GridConfig;
use cachegrid_core::persistence::Backend;
use cachegrid_session::{Command, Controller, TracingSurface, run_session};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => GridConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GridConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .with_target(false)
        .init();

    info!(
        backend = %config.persistence.backend,
        db_path = %config.persistence.db_path,
        radius = config.world.neighborhood_radius,
        "cachegrid starting"
    );

    let (store, recovery) =
        Backend::open_or_recover(&config.persistence).context("opening durable store")?;
    let autosave = Duration::from_secs(config.persistence.auto_save_interval_seconds);
    // Positions arrive as `geo` lines, so the capability is always present.
    let controller = Controller::start(config, store, TracingSurface, true);
    controller.note_store_recovery(&recovery);

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(read_commands(tx));

    let controller = run_session(controller, rx, autosave).await;
    let counters = controller.counters().snapshot();
    info!(
        cell = %controller.state().player_cell(),
        held = controller.state().player.inventory.len(),
        caches = controller.state().world.len(),
        collects = counters.collects,
        deposits = counters.deposits,
        saves = counters.saves_completed,
        recoveries = counters.store_recoveries,
        "cachegrid stopped"
    );
    Ok(())
}

/// Forward parsed stdin lines until EOF, Ctrl-C, or the session going away.
async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                if tx.send(command).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!(line = %line, "{e}"),
        }
    }
}
