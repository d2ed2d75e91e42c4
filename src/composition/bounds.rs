use tracing::info;

use crate::error::{CompositionError, Result};
use crate::frames::CropRect;

/// Union of every frame's crop rectangle
///
/// All frames are normalized against this box so that their relative size and
/// position survive the shared rescale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedBounds {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl SharedBounds {
    /// Returns `None` for an empty set of rectangles
    pub fn from_rects(rects: &[CropRect]) -> Option<Self> {
        let first = rects.first()?;
        let bounds = rects.iter().skip(1).fold(
            Self {
                left: first.left,
                top: first.top,
                right: first.right,
                bottom: first.bottom,
            },
            |acc, r| Self {
                left: acc.left.min(r.left),
                top: acc.top.min(r.top),
                right: acc.right.max(r.right),
                bottom: acc.bottom.max(r.bottom),
            },
        );
        Some(bounds)
    }

    /// Size in source pixels that every normalized frame must fit in
    pub fn frame_extent(&self) -> (u32, u32) {
        (self.right - self.left, self.bottom - self.top)
    }

    /// Ratio that maps the longer side of the frame extent onto `target_dimension`
    pub fn scale_factor(&self, target_dimension: u32) -> Result<ScaleFactor> {
        let (width, height) = self.frame_extent();
        let longest = width.max(height);

        if longest == 0 {
            return Err(CompositionError::DegenerateBounds {
                left: self.left,
                top: self.top,
                right: self.right,
                bottom: self.bottom,
            }
            .into());
        }

        let scale = ScaleFactor(target_dimension as f64 / longest as f64);
        info!(
            "Shared bounds ({}, {}, {}, {}), extent {}x{}, scale {:.6}",
            self.left, self.top, self.right, self.bottom, width, height, scale.0
        );
        Ok(scale)
    }

    /// Offset of `rect` from the shared origin after scaling, as (left, top)
    pub fn scaled_offset(&self, rect: &CropRect, scale: ScaleFactor) -> (u32, u32) {
        (
            scale.apply(rect.left - self.left),
            scale.apply(rect.top - self.top),
        )
    }
}

/// Uniform resize ratio applied to every frame and every crop offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(pub f64);

impl ScaleFactor {
    /// Scale a length and truncate toward zero
    pub fn apply(&self, value: u32) -> u32 {
        (self.0 * value as f64) as u32
    }

    pub fn apply_pair(&self, (width, height): (u32, u32)) -> (u32, u32) {
        (self.apply(width), self.apply(height))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}
