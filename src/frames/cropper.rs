//! Pass 1: per-frame opaque bounding boxes.
//!
//! Every frame is reduced to the tightest rectangle holding a pixel with
//! non-zero alpha. The rectangle (in original coordinates) is kept next to the
//! cropped pixels so the composer can realign frames against each other.

use image::imageops;
use ndarray::{ArrayView3, Axis};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{FrameError, Result};
use crate::frames::types::{CropRect, CroppedFrame, Frame};

const ALPHA: usize = 3;

/// Compute the opaque bounding box of `frame` and crop it.
///
/// The crop is end-exclusive at `right`/`bottom` while those fields hold the
/// last opaque index, so the cropped frame is `(right - left) x (bottom - top)`
/// and the final opaque column and row are dropped. Downstream sidecar
/// consumers depend on those dimensions.
pub fn blend(frame: &Frame) -> Result<(CropRect, Frame)> {
    let rect = opaque_bounds(frame)?;

    let cropped = imageops::crop_imm(
        frame.as_image(),
        rect.left,
        rect.top,
        rect.width(),
        rect.height(),
    )
    .to_image();

    let cropped = match frame.source() {
        Some(path) => Frame::with_source(cropped, path),
        None => Frame::new(cropped),
    };

    Ok((rect, cropped))
}

/// Run [`blend`] over every frame, preserving input order.
///
/// Frames are independent so the work is spread over the rayon pool; if
/// several frames are empty the lowest index is reported.
pub fn crop_all(frames: Vec<Frame>) -> Result<Vec<CroppedFrame>> {
    info!("Cropping {} frames to their opaque bounds", frames.len());

    let results: Vec<Result<CroppedFrame>> = frames
        .par_iter()
        .map(|frame| blend(frame).map(|(rect, frame)| CroppedFrame { rect, frame }))
        .collect();
    let cropped = results.into_iter().collect::<Result<Vec<_>>>()?;

    for (i, c) in cropped.iter().enumerate() {
        debug!(
            "Frame {:03} ({}): crop ({}, {}, {}, {})",
            i,
            c.frame.label(),
            c.rect.left,
            c.rect.top,
            c.rect.right,
            c.rect.bottom
        );
    }

    Ok(cropped)
}

fn opaque_bounds(frame: &Frame) -> Result<CropRect> {
    let image = frame.as_image();
    let (width, height) = image.dimensions();

    let pixels = ArrayView3::from_shape((height as usize, width as usize, 4), image.as_raw().as_slice())
        .map_err(|e| FrameError::InvalidRaster {
            reason: format!("{}: {}", frame.label(), e),
        })?;
    let alpha = pixels.index_axis(Axis(2), ALPHA);

    // Collapse rows to get one flag per column, and columns for one per row.
    let columns = alpha.map_axis(Axis(0), |column| column.iter().any(|&a| a != 0));
    let rows = alpha.map_axis(Axis(1), |row| row.iter().any(|&a| a != 0));

    let empty = || FrameError::EmptyFrame { frame: frame.label() };

    let left = columns.iter().position(|&c| c).ok_or_else(empty)?;
    let right = columns.iter().rposition(|&c| c).ok_or_else(empty)?;
    let top = rows.iter().position(|&r| r).ok_or_else(empty)?;
    let bottom = rows.iter().rposition(|&r| r).ok_or_else(empty)?;

    Ok(CropRect::new(left as u32, top as u32, right as u32, bottom as u32))
}
