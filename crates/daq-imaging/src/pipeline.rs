//! The per-event corruption pipeline.
//!
//! Rendering is CPU-bound and synchronous. Callers on an async runtime run
//! it on the blocking pool and pass in an RNG they own, which also makes a
//! render reproducible from a seed.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder as _};
use rand::Rng;
use rand_distr::{Distribution as _, Normal};

use crate::config::ImagingConfig;
use crate::digest::content_id;
use crate::error::RenderError;

/// Largest 8-bit sample value, as a float.
const MAX_SAMPLE: f64 = 255.0;

/// Extension of rendered objects.
const OBJECT_EXTENSION: &str = "jpg";

/// One rendered event: compressed payload plus its content-derived names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    /// JPEG-encoded bytes.
    pub payload: Vec<u8>,
    /// Hex digest of `payload`.
    pub content_id: String,
    /// Object name derived from the digest (`<prefix>-<content_id>.jpg`).
    pub object_name: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

/// Channel layout kept through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Gray,
    Rgb,
}

impl Layout {
    const fn color_type(self) -> ExtendedColorType {
        match self {
            Self::Gray => ExtendedColorType::L8,
            Self::Rgb => ExtendedColorType::Rgb8,
        }
    }
}

/// An 8-bit frame between decoding and encoding.
#[derive(Debug)]
struct Frame {
    samples: Vec<u8>,
    width: u32,
    height: u32,
    layout: Layout,
}

/// Turns source images into corrupted, compressed, content-addressed payloads.
#[derive(Debug, Clone)]
pub struct ImagePipeline {
    noise: Option<Normal<f64>>,
    quality: u8,
    prefix: String,
}

impl ImagePipeline {
    /// Build a pipeline from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidConfig`] if the noise level is negative
    /// or not finite, or the JPEG quality is outside 1-100.
    pub fn new(config: &ImagingConfig) -> Result<Self, RenderError> {
        if !config.noise_level.is_finite() || config.noise_level < 0.0 {
            return Err(RenderError::InvalidConfig {
                reason: format!("noise_level must be >= 0, got {}", config.noise_level),
            });
        }
        if !(1..=100).contains(&config.jpeg_quality) {
            return Err(RenderError::InvalidConfig {
                reason: format!("jpeg_quality must be in 1..=100, got {}", config.jpeg_quality),
            });
        }

        let noise = if config.noise_level > 0.0 {
            Some(Normal::new(0.0, config.noise_level).map_err(|e| {
                RenderError::InvalidConfig {
                    reason: format!("invalid noise distribution: {e}"),
                }
            })?)
        } else {
            None
        };

        Ok(Self {
            noise,
            quality: config.jpeg_quality,
            prefix: config.object_prefix.clone(),
        })
    }

    /// Render one event from `source`.
    ///
    /// Noise is drawn fresh from `rng` on every call, so two renders of the
    /// same source differ unless the noise level is zero.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Decode`] if the source cannot be read and
    /// [`RenderError::Encode`] if JPEG encoding fails.
    pub fn render<R: Rng + ?Sized>(
        &self,
        source: &Path,
        rng: &mut R,
    ) -> Result<RenderedImage, RenderError> {
        let image = image::open(source).map_err(|e| RenderError::Decode {
            path: source.to_path_buf(),
            source: e,
        })?;

        let mut frame = to_frame(&image);
        self.corrupt(&mut frame, rng);
        let payload = encode_jpeg(&frame, self.quality)?;

        let content_id = content_id(&payload);
        let object_name = format!("{}-{content_id}.{OBJECT_EXTENSION}", self.prefix);

        tracing::trace!(
            source = %source.display(),
            object_name = object_name,
            bytes = payload.len(),
            "Rendered event image"
        );

        Ok(RenderedImage {
            payload,
            content_id,
            object_name,
            width: frame.width,
            height: frame.height,
        })
    }

    /// Add Gaussian noise to every normalized sample, then clip and requantize.
    fn corrupt<R: Rng + ?Sized>(&self, frame: &mut Frame, rng: &mut R) {
        let Some(noise) = &self.noise else {
            return;
        };
        for sample in &mut frame.samples {
            let value = f64::from(*sample) / MAX_SAMPLE + noise.sample(rng);
            *sample = quantize(value);
        }
    }
}

/// Decode into 8-bit samples, keeping grayscale sources single-channel.
fn to_frame(image: &DynamicImage) -> Frame {
    if image.color().has_color() {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        Frame {
            samples: rgb.into_raw(),
            width,
            height,
            layout: Layout::Rgb,
        }
    } else {
        let luma = image.to_luma8();
        let (width, height) = luma.dimensions();
        Frame {
            samples: luma.into_raw(),
            width,
            height,
            layout: Layout::Gray,
        }
    }
}

/// Clip a normalized value to [0, 1] and round it to the nearest 8-bit level.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize(value: f64) -> u8 {
    // Clamped to [0, 255] before the cast, so it cannot truncate.
    (value.clamp(0.0, 1.0) * MAX_SAMPLE).round() as u8
}

fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, RenderError> {
    let mut payload = Vec::new();
    JpegEncoder::new_with_quality(&mut payload, quality)
        .write_image(
            &frame.samples,
            frame.width,
            frame.height,
            frame.layout.color_type(),
        )
        .map_err(RenderError::Encode)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_clips_and_rounds() {
        assert_eq!(quantize(-0.3), 0);
        assert_eq!(quantize(1.7), 255);
        assert_eq!(quantize(128.0 / 255.0), 128);
        assert_eq!(quantize(0.5), 128);
    }

    #[test]
    fn rejects_bad_parameters() {
        let negative = ImagingConfig {
            noise_level: -0.1,
            ..ImagingConfig::default()
        };
        assert!(ImagePipeline::new(&negative).is_err());

        let zero_quality = ImagingConfig {
            jpeg_quality: 0,
            ..ImagingConfig::default()
        };
        assert!(ImagePipeline::new(&zero_quality).is_err());

        assert!(ImagePipeline::new(&ImagingConfig::default()).is_ok());
    }

    #[test]
    fn zero_noise_leaves_samples_untouched() {
        let pipeline = ImagePipeline::new(&ImagingConfig {
            noise_level: 0.0,
            ..ImagingConfig::default()
        });
        assert!(pipeline.is_ok());
        let Ok(pipeline) = pipeline else { return };

        let mut frame = Frame {
            samples: vec![0, 17, 128, 255],
            width: 2,
            height: 2,
            layout: Layout::Gray,
        };
        pipeline.corrupt(&mut frame, &mut rand::rng());
        assert_eq!(frame.samples, vec![0, 17, 128, 255]);
    }
}
