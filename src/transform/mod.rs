//! Transform layer.
//!
//! This module turns fetched source bytes into the artifact that is cached
//! and served:
//!
//! - [`TransformPipeline`]: directive-driven convert → resize → optimize
//!   stages over raster pixels, zero-copy passthrough when no stage is
//!   required
//! - [`PipelineConfig`]: enumerated options (recompression quality,
//!   per-format external optimizer overrides)
//! - [`OptimizerCommand`]: supervised external optimizer subprocess with
//!   timeout and bounded output

mod pipeline;
mod subprocess;

pub use pipeline::{PipelineConfig, TransformPipeline, DEFAULT_JPEG_QUALITY};
pub use subprocess::{
    OptimizerCommand, DEFAULT_OPTIMIZER_OUTPUT_BYTES, DEFAULT_OPTIMIZER_TIMEOUT,
};
