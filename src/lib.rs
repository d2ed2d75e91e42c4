//! # Turntable Stitcher
//!
//! Turn a sequence of per-angle renders of a 3D model into a single sprite
//! strip plus a sidecar of frame offsets, ready to embed as a rotating viewer
//! on a wiki page.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use turntable_stitcher::{Config, StitchEngine};
//!
//! # fn main() -> turntable_stitcher::Result<()> {
//! let engine = StitchEngine::new(Config::default());
//! let report = engine.run("renders/", "out/")?;
//! println!("{} frames -> {:?}", report.frame_count, report.image_path);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The pipeline is a strict two-pass algorithm:
//!
//! - [`frames`] - Frame discovery, decoding and per-frame cropping (pass 1)
//! - [`composition`] - Shared bounds, scaling and strip assembly (pass 2)
//! - [`output`] - Image encoders and the offset sidecar
//! - [`config`] - Configuration management
//!
//! The two passes can also be driven directly:
//!
//! ```rust,no_run
//! use turntable_stitcher::composition::{compose, StripParams};
//! use turntable_stitcher::frames::{crop_all, FrameLoader};
//!
//! # fn main() -> turntable_stitcher::Result<()> {
//! let frames = FrameLoader::load_directory("renders/")?;
//! let cropped = crop_all(frames)?;
//! let strip = compose(&cropped, &StripParams {
//!     y_rotations: 16,
//!     x_rotations_total: 3,
//!     target_dimension: 280,
//! })?;
//! println!("{} offsets", strip.offsets.len());
//! # Ok(())
//! # }
//! ```

pub mod composition;
pub mod config;
pub mod error;
pub mod frames;
pub mod output;

// Re-export commonly used types for convenience
pub use crate::{
    composition::{StitchEngine, StitchReport},
    config::Config,
    error::{Result, StitchError},
    output::{EncoderRegistry, ImageEncoder},
};
