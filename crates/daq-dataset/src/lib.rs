//! Local source image cache for the DAQ injector.
//!
//! The injector renders every event from a pool of simulated detector images
//! split into two categories. This crate guarantees that pool exists on local
//! disk: on first use it streams the published tar archive to disk, unpacks
//! it, and from then on only rescans the cache directory.
//!
//! # Layout
//!
//! ```text
//! <cache_root>/
//!     original.tar        (transient, removed after extraction)
//!     original/           (cache_dir)
//!         NR/*.png        (signal)
//!         ER/*.png        (background)
//! ```
//!
//! # Modules
//!
//! - [`config`] -- Cache location, archive source, category directories
//! - [`catalog`] -- Scanning the cache into a [`SourceCatalog`]
//! - [`download`] -- Streamed archive transfer
//! - [`cache`] -- [`DatasetCache::ensure`], the bootstrap entry point
//! - [`error`] -- Shared error types

pub mod cache;
pub mod catalog;
pub mod config;
pub mod download;
pub mod error;

pub use cache::DatasetCache;
pub use catalog::SourceCatalog;
pub use config::DatasetConfig;
pub use error::DatasetError;
