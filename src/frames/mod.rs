//! # Frame Handling
//!
//! Discovery and decoding of rendered turntable frames, and the first pass of
//! the pipeline: cropping each frame to its opaque content.

pub mod cropper;
pub mod loader;
pub mod types;

pub use cropper::{blend, crop_all};
pub use loader::FrameLoader;
pub use types::{CropRect, CroppedFrame, Frame};
