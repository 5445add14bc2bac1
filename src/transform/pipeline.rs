//! The transform pipeline.
//!
//! Turns raw source bytes into the final artifact. Stage ordering is fixed
//! and directive-driven:
//!
//! 1. *convert* — when the requested output format differs from the source
//!    format;
//! 2. *resize* — when a width or height directive is present; both axes
//!    crop-fill anchored at the center, a single axis derives the other
//!    from the source aspect ratio;
//! 3. *optimize* — for the final format, whenever any stage ran or the
//!    output format was requested explicitly: raster formats are
//!    recompressed at the configured quality, vector formats are handed to
//!    an external minifier when one is configured.
//!
//! A request whose directives require no stage is a zero-copy passthrough:
//! the input bytes are returned unchanged (and are still cached upstream
//! under their own path key).
//!
//! Raster work happens in-process on decoded pixels, so convert and resize
//! collapse into a single decode → operate → encode pass with identical
//! observable results. The pipeline is deterministic: identical directives
//! over identical input bytes produce identical output bytes.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use tracing::debug;

use crate::error::TransformError;
use crate::format::ImageFormat;
use crate::path::TransformRequest;

use super::subprocess::OptimizerCommand;

/// Default quality for lossy raster recompression.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

// =============================================================================
// Pipeline Configuration
// =============================================================================

/// Enumerated pipeline options, validated once at construction.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// JPEG recompression quality (1-100)
    pub jpeg_quality: u8,

    /// External optimizer overrides per output format. When set for a
    /// format, the command replaces the built-in recompression for it.
    pub jpg_optimizer: Option<OptimizerCommand>,
    pub png_optimizer: Option<OptimizerCommand>,
    pub gif_optimizer: Option<OptimizerCommand>,
    pub svg_optimizer: Option<OptimizerCommand>,
}

impl PipelineConfig {
    /// The external optimizer configured for a format, if any.
    fn optimizer_for(&self, format: ImageFormat) -> Option<&OptimizerCommand> {
        match format {
            ImageFormat::Jpg => self.jpg_optimizer.as_ref(),
            ImageFormat::Png => self.png_optimizer.as_ref(),
            ImageFormat::Gif => self.gif_optimizer.as_ref(),
            ImageFormat::Svg => self.svg_optimizer.as_ref(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            jpg_optimizer: None,
            png_optimizer: None,
            gif_optimizer: None,
            svg_optimizer: None,
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Applies the directive-driven stages to source bytes.
#[derive(Debug, Clone, Default)]
pub struct TransformPipeline {
    config: PipelineConfig,
}

impl TransformPipeline {
    /// Create a pipeline with the given options.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline for one request.
    ///
    /// # Errors
    ///
    /// - [`TransformError::Decode`] when the source bytes cannot be decoded
    ///   as an image (treated like a missing source upstream);
    /// - [`TransformError::Stage`] when a stage produces no or invalid
    ///   output, including conversions or resizes involving a vector
    ///   format, which no in-process codec supports.
    pub async fn apply(
        &self,
        input: Bytes,
        request: &TransformRequest,
    ) -> Result<Bytes, TransformError> {
        let source = request.source_format();
        let target = request.target_format();

        let convert = request.wants_conversion();
        let resize = request.wants_resize();
        // An explicit format directive requests optimization even when it
        // names the format the source already has.
        let optimize = convert || resize || request.format.is_some();

        if !optimize {
            return Ok(input);
        }

        if source.is_vector() || target.is_vector() {
            if convert || resize {
                return Err(TransformError::stage(
                    if convert { "convert" } else { "resize" },
                    format!("cannot transform vector image ({source} -> {target})"),
                ));
            }
            // Optimize-only on a vector: external minifier or passthrough.
            return match self.config.optimizer_for(target) {
                Some(command) => command.run(&input).await,
                None => Ok(input),
            };
        }

        debug!(%source, %target, convert, resize, "running transform pipeline");

        let image = decode_source(&input, source)?;
        let image = match (request.width, request.height) {
            (None, None) => image,
            (width, height) => resize_stage(image, width, height),
        };
        let encoded = encode_stage(&image, target, self.config.jpeg_quality)?;

        match self.config.optimizer_for(target) {
            Some(command) => command.run(&encoded).await,
            None => Ok(encoded),
        }
    }
}

// =============================================================================
// Stages
// =============================================================================

/// Decode the source bytes. This is the only place a failure is attributed
/// to the source image itself.
fn decode_source(input: &[u8], format: ImageFormat) -> Result<DynamicImage, TransformError> {
    let codec = format
        .codec_format()
        .ok_or_else(|| TransformError::Decode(format!("no codec for {format}")))?;

    ImageReader::with_format(Cursor::new(input), codec)
        .decode()
        .map_err(|e| TransformError::Decode(e.to_string()))
}

/// Resize per the directives.
///
/// Both axes: scale-and-crop filling the exact box, anchored at the center.
/// One axis: the missing axis follows the source aspect ratio.
fn resize_stage(image: DynamicImage, width: Option<u32>, height: Option<u32>) -> DynamicImage {
    match (width, height) {
        (Some(w), Some(h)) => image.resize_to_fill(w, h, FilterType::Lanczos3),
        (Some(w), None) => {
            let h = scale_axis(image.height(), image.width(), w);
            image.resize_exact(w, h, FilterType::Lanczos3)
        }
        (None, Some(h)) => {
            let w = scale_axis(image.width(), image.height(), h);
            image.resize_exact(w, h, FilterType::Lanczos3)
        }
        (None, None) => image,
    }
}

/// Derive the free axis when only one is constrained, rounding to nearest
/// and never collapsing to zero.
fn scale_axis(free: u32, constrained: u32, target: u32) -> u32 {
    let constrained = u64::from(constrained.max(1));
    let scaled = (u64::from(free) * u64::from(target) + constrained / 2) / constrained;
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Encode pixels in the final output format, applying lossy recompression
/// for JPEG at the configured quality.
fn encode_stage(
    image: &DynamicImage,
    format: ImageFormat,
    jpeg_quality: u8,
) -> Result<Bytes, TransformError> {
    let mut output = Vec::new();

    match format {
        ImageFormat::Jpg => {
            // JPEG carries no alpha channel.
            let rgb = image.to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut output, jpeg_quality.clamp(1, 100));
            encoder
                .encode_image(&rgb)
                .map_err(|e| TransformError::stage("convert", e.to_string()))?;
        }
        ImageFormat::Png => {
            image
                .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
                .map_err(|e| TransformError::stage("convert", e.to_string()))?;
        }
        ImageFormat::Gif => {
            DynamicImage::ImageRgba8(image.to_rgba8())
                .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Gif)
                .map_err(|e| TransformError::stage("convert", e.to_string()))?;
        }
        ImageFormat::Svg => {
            return Err(TransformError::stage(
                "convert",
                "cannot encode raster pixels as svg",
            ));
        }
    }

    if output.is_empty() {
        return Err(TransformError::stage("convert", "encoder produced no output"));
    }
    Ok(Bytes::from(output))
}

// =============================================================================
// Tests
// =============================================================================
