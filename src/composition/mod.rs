//! # Strip Composition
//!
//! The second pass of the pipeline: shared bounds across all cropped frames,
//! the uniform scale, and the strip itself. [`StitchEngine`] drives the whole
//! run from a directory of renders to the written artifacts.

pub mod bounds;
pub mod engine;
pub mod strip;

// Re-exports for convenience
pub use bounds::{ScaleFactor, SharedBounds};
pub use engine::{StitchEngine, StitchReport};
pub use strip::{compose, paste_masked, ComposedStrip, OffsetEntry, StripParams};
