//! Truth ledger audit.
//!
//! Streams every row of the injector's truth ledger in emission order and
//! prints a per-category summary. Safe to run while the injector is
//! writing.
//!
//! ```text
//! daq-audit [LEDGER_PATH]
//! ```
//!
//! Without an argument the ledger path comes from the injector's
//! configuration (`SQLITE_TRUTH`, `ledger.path`, default `truth.db`). The
//! configuration is not validated, and it is not read at all when a path
//! is given.

use std::path::PathBuf;

use anyhow::Context;
use daq_core::config::InjectorConfig;
use daq_db::{CategoryTotals, LedgerConfig, TruthLedger};
use futures::TryStreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let ledger_config = match std::env::args_os().nth(1) {
        Some(path) => LedgerConfig::new(&PathBuf::from(path)),
        None => {
            InjectorConfig::resolve()
                .context("reading injector configuration")?
                .ledger
        }
    };
    info!(path = %ledger_config.path.display(), "Opening truth ledger");

    let ledger = TruthLedger::open(&ledger_config)
        .await
        .with_context(|| format!("opening {}", ledger_config.path.display()))?;
    let mut rows = ledger.all().await.context("querying truth table")?;

    let mut totals = CategoryTotals::default();
    while let Some(record) = rows.try_next().await.context("reading truth row")? {
        totals.add(record.category());
        println!(
            "{:>8}  {}  {:<10}  {}  {}",
            totals.total(),
            record.timestamp.to_rfc3339(),
            record.category().as_str(),
            record.object_name,
            record.source_path.display(),
        );
    }

    println!(
        "{} events: {} signal, {} background",
        totals.total(),
        totals.signal,
        totals.background
    );
    Ok(())
}
