//! Error types for the injector binary.
//!
//! [`AppError`] wraps every failure mode of startup and the emission loop so
//! `main` can propagate with `?`.

use daq_core::collaborators::StoreError;
use daq_core::config::ConfigError;
use daq_core::error::InjectorError;
use daq_dataset::DatasetError;
use daq_db::DbError;

/// Top-level error for the injector binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The NATS connection could not be established.
    #[error("NATS error: {message}")]
    Nats {
        /// Description of the NATS failure.
        message: String,
    },

    /// The object store client could not be built.
    #[error("object store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// The truth ledger could not be opened.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying database error.
        #[from]
        source: DbError,
    },

    /// The dataset cache could not be set up.
    #[error("dataset error: {source}")]
    Dataset {
        /// The underlying dataset error.
        #[from]
        source: DatasetError,
    },

    /// The emission loop stopped.
    #[error("injector error ({}): {source}", .source.kind())]
    Injector {
        /// The error that ended the loop.
        #[from]
        source: InjectorError,
    },
}
