//! Imaging configuration.

use serde::Deserialize;

/// Parameters of the per-event corruption pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImagingConfig {
    /// Standard deviation of the Gaussian noise added to each normalized
    /// sample.
    #[serde(default = "default_noise_level")]
    pub noise_level: f64,

    /// JPEG quality factor (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Prefix of generated object names (`<prefix>-<digest>.jpg`).
    #[serde(default = "default_object_prefix")]
    pub object_prefix: String,
}

impl Default for ImagingConfig {
    fn default() -> Self {
        Self {
            noise_level: default_noise_level(),
            jpeg_quality: default_jpeg_quality(),
            object_prefix: default_object_prefix(),
        }
    }
}

const fn default_noise_level() -> f64 {
    0.02
}

const fn default_jpeg_quality() -> u8 {
    80
}

fn default_object_prefix() -> String {
    "cygno".to_owned()
}
