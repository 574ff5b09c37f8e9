//! Error types for image rendering.

use std::path::PathBuf;

/// Errors that can occur while rendering an event image.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The source image could not be read or decoded.
    #[error("failed to decode source image {path}: {source}")]
    Decode {
        /// The source image path.
        path: PathBuf,
        /// The underlying image error.
        source: image::ImageError,
    },

    /// The corrupted image could not be JPEG-encoded.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// Invalid pipeline parameters.
    #[error("invalid imaging configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}
