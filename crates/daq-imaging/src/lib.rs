//! Detector image rendering for the DAQ injector.
//!
//! Each emitted event is a real simulated detector image degraded the way a
//! live readout would be: Gaussian noise on every sample, requantization to
//! 8 bits, and lossy JPEG compression. The compressed bytes are named by
//! their own digest, so byte-identical outputs collapse onto one object.
//!
//! # Pipeline
//!
//! ```text
//! source.png --> decode --> [0,1] + N(0, noise) --> clip, 8-bit --> JPEG --> SHA-256
//! ```
//!
//! # Modules
//!
//! - [`config`] -- Noise level, JPEG quality, object name prefix
//! - [`pipeline`] -- [`ImagePipeline`] and its stages
//! - [`digest`] -- Content identifiers
//! - [`error`] -- Shared error types

pub mod config;
pub mod digest;
pub mod error;
pub mod pipeline;

pub use config::ImagingConfig;
pub use digest::content_id;
pub use error::RenderError;
pub use pipeline::{ImagePipeline, RenderedImage};
