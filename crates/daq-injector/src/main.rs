//! DAQ injector service.
//!
//! Emits a continuous stream of simulated detector events into a data
//! acquisition pipeline. Each event is a real simulated detector image,
//! degraded with noise and JPEG compression, uploaded to MinIO under its
//! content digest and announced on NATS with a presigned retrieval URL.
//! The ground-truth category of every event is kept in a local `SQLite`
//! ledger for later evaluation of downstream classifiers.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (`DAQ_CONFIG` or `daq-injector.yaml`, then the
//!    environment)
//! 2. Initialize structured logging (tracing)
//! 3. Connect to NATS and build the object store client
//! 4. Open the truth ledger
//! 5. Run the emission loop until it fails or Ctrl-C is received; on
//!    Ctrl-C the ledger is closed before exit

mod error;
mod nats;
mod object_store;

use daq_core::config::{InjectorConfig, LogFormat, LoggingConfig};
use daq_core::runner::Injector;
use daq_dataset::DatasetCache;
use daq_db::TruthLedger;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;
use crate::nats::NatsBus;
use crate::object_store::S3ObjectStore;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if initialization fails or the emission loop stops.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = InjectorConfig::load().map_err(AppError::from)?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("daq-injector starting");
    info!(
        object_store = %config.object_store.endpoint_url(),
        bucket = %config.object_store.bucket,
        nats_url = %config.message_bus.nats_url,
        archive_url = %config.dataset.archive_url,
        cache_dir = %config.dataset.cache_dir().display(),
        ledger = %config.ledger.path.display(),
        events_per_hour = config.sampling.events_per_hour,
        max_signal_fraction = config.sampling.max_signal_fraction,
        "Configuration loaded"
    );

    // 3. Connect collaborators.
    let bus = NatsBus::connect(&config.message_bus.nats_url).await?;
    let store = S3ObjectStore::new(&config.object_store).map_err(AppError::from)?;

    // 4. Open the ledger and the dataset cache.
    let ledger = TruthLedger::open(&config.ledger)
        .await
        .map_err(AppError::from)?;
    let dataset = DatasetCache::new(config.dataset.clone()).map_err(AppError::from)?;

    // 5. Run.
    let injector = Injector::new(&config, bus, store, ledger.clone()).map_err(AppError::from)?;
    tokio::select! {
        result = injector.run(&dataset) => {
            let err = match result {
                Ok(never) => match never {},
                Err(err) => err,
            };
            error!(kind = %err.kind(), error = %err, "Emission loop stopped");
            Err(AppError::from(err).into())
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown requested");
            ledger.close().await;
            Ok(())
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}
