//! Error types for the emission loop.
//!
//! Every component error surfaces through [`InjectorError`] and terminates
//! the loop. [`InjectorError::kind`] classifies the failure for reporting.

use std::fmt;

use daq_dataset::DatasetError;
use daq_db::DbError;
use daq_imaging::RenderError;
use daq_types::Category;

use crate::collaborators::{BusError, StoreError};
use crate::config::ConfigError;
use crate::runner::LoopState;
use crate::sampler::SamplerError;

/// Broad classification of an [`InjectorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or out-of-range configuration.
    Configuration,
    /// Download, upload, presign, or publish failure.
    Network,
    /// Unreadable image or corrupt archive.
    Decode,
    /// Local filesystem or ledger failure.
    Storage,
    /// Misuse of the loop or a failed background task.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::Network => "network",
            Self::Decode => "decode",
            Self::Storage => "storage",
            Self::Internal => "internal",
        };
        f.write_str(label)
    }
}

/// Errors that terminate the emission loop.
#[derive(Debug, thiserror::Error)]
pub enum InjectorError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Sampling parameters are invalid or a delay overflowed.
    #[error(transparent)]
    Sampler(#[from] SamplerError),

    /// The source dataset could not be made available.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// A source image could not be rendered.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The truth ledger rejected a write.
    #[error(transparent)]
    Ledger(#[from] DbError),

    /// The object store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The message bus failed.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// A data message could not be serialized.
    #[error("failed to serialize data message: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The catalog holds no image of the drawn category.
    #[error("no {category} images available")]
    EmptyCategory {
        /// The drawn category.
        category: Category,
    },

    /// An operation was invoked in a state that does not permit it.
    #[error("cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current state.
        from: LoopState,
        /// Requested state.
        to: LoopState,
    },

    /// A blocking render task panicked or was cancelled.
    #[error("render task failed: {0}")]
    Task(String),
}

impl InjectorError {
    /// Classify the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Sampler(SamplerError::InvalidParameter { .. }) => {
                ErrorKind::Configuration
            }
            Self::Dataset(err) => match err {
                DatasetError::MissingSource => ErrorKind::Configuration,
                DatasetError::Download { .. } => ErrorKind::Network,
                DatasetError::Extract { .. } | DatasetError::EmptyCategory { .. } => {
                    ErrorKind::Decode
                }
                DatasetError::Io { .. } => ErrorKind::Storage,
                DatasetError::Task(_) => ErrorKind::Internal,
            },
            Self::Render(err) => match err {
                RenderError::Decode { .. } | RenderError::Encode(_) => ErrorKind::Decode,
                RenderError::InvalidConfig { .. } => ErrorKind::Configuration,
            },
            Self::Ledger(_) => ErrorKind::Storage,
            Self::Store(_) | Self::Bus(_) => ErrorKind::Network,
            Self::Sampler(SamplerError::UnrepresentableDelay { .. })
            | Self::Serialize(_)
            | Self::EmptyCategory { .. }
            | Self::InvalidTransition { .. }
            | Self::Task(_) => ErrorKind::Internal,
        }
    }
}
