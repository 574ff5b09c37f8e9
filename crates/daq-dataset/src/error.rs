//! Error types for the dataset cache.

use std::path::PathBuf;

/// Errors that can occur while bootstrapping the source image cache.
///
/// Every variant is fatal for the injector: there is no retry and no
/// fallback to a partially populated cache.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// No archive source was configured.
    #[error("no dataset archive URL configured")]
    MissingSource,

    /// The archive could not be fetched.
    #[error("failed to download {url}: {source}")]
    Download {
        /// The archive URL.
        url: String,
        /// The underlying HTTP error.
        source: reqwest::Error,
    },

    /// The archive could not be unpacked.
    #[error("failed to extract archive {path}: {source}")]
    Extract {
        /// The archive file being unpacked.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A filesystem operation on the cache failed.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A category directory holds no images after bootstrap.
    #[error("no images found for category {category} in {dir}")]
    EmptyCategory {
        /// The category that is empty.
        category: daq_types::Category,
        /// The directory that was scanned.
        dir: PathBuf,
    },

    /// A blocking cache task panicked or was cancelled.
    #[error("dataset task failed: {0}")]
    Task(String),
}

impl DatasetError {
    /// Build a [`DatasetError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure came from the network rather than local disk.
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Download { .. })
    }
}
