//! # Output Artifacts
//!
//! Encoding of the composed strip and rendering of the offset sidecar.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use turntable_stitcher::output::{EncoderRegistry, EncoderSettings};
//!
//! let registry = EncoderRegistry::new();
//! let png = registry.get_encoder("png").unwrap();
//! let settings = EncoderSettings::default();
//! // Encode the composed canvas with png.encode(&canvas, &mut writer, &settings)
//! ```

pub mod jpeg_encoder;
pub mod png_encoder;
pub mod registry;
pub mod sidecar;
pub mod traits;
pub mod writer;

pub use jpeg_encoder::JpegEncoder;
pub use png_encoder::PngEncoder;
pub use registry::EncoderRegistry;
pub use sidecar::Sidecar;
pub use traits::{EncoderSettings, ImageEncoder, PngCompression};
pub use writer::replace_file;
