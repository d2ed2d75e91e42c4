//! Pass 2: normalize every cropped frame against the shared bounds and paste
//! them side by side into one strip.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::{debug, info, warn};

use crate::composition::bounds::{ScaleFactor, SharedBounds};
use crate::error::{CompositionError, Result};
use crate::frames::{CropRect, CroppedFrame};

/// Fill of the pre-allocated canvas. White so that lossy output, which drops
/// alpha, shows a white background.
pub const CANVAS_FILL: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Transparent column left after every pasted frame
pub const FRAME_GAP: u32 = 1;

/// Largest RGBA canvas, in bytes, that `compose` will allocate
pub const MAX_CANVAS_BYTES: u64 = 1 << 31;

/// Layout parameters for one strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripParams {
    /// Turntable steps around the vertical axis
    pub y_rotations: u32,

    /// Total camera tilt positions per turntable step
    pub x_rotations_total: u32,

    /// Long-edge size of a normalized frame, in output pixels
    pub target_dimension: u32,
}

impl StripParams {
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("y_rotations", self.y_rotations),
            ("x_rotations_total", self.x_rotations_total),
            ("target_dimension", self.target_dimension),
        ] {
            if value == 0 {
                return Err(CompositionError::InvalidParameters {
                    details: format!("{} must be positive", key),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Where one frame sits inside the strip, as written to the sidecar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetEntry {
    /// Horizontal paste offset minus the frame index
    pub offset: u32,

    /// Height of the scaled frame
    pub height: u32,

    /// Scaled distance of the frame's content from the shared left edge
    pub left_crop: u32,
}

impl OffsetEntry {
    pub fn values(&self) -> [u32; 3] {
        [self.offset, self.height, self.left_crop]
    }
}

/// Result of composing a strip
#[derive(Debug, Clone)]
pub struct ComposedStrip {
    pub canvas: RgbaImage,
    pub offsets: Vec<OffsetEntry>,
    pub bounds: SharedBounds,
    pub scale: ScaleFactor,

    /// Scaled frame extent, the slot size the viewer slices with
    pub frame_width: u32,
    pub frame_height: u32,
}

impl ComposedStrip {
    pub fn canvas_width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn canvas_height(&self) -> u32 {
        self.canvas.height()
    }
}

/// Compose cropped frames into a single horizontal strip.
///
/// Frames are pasted in order at an accumulating horizontal offset, each
/// followed by a one pixel transparent gap, and vertically at their scaled
/// distance from the shared top edge. The canvas is trimmed to the final
/// offset.
pub fn compose(frames: &[CroppedFrame], params: &StripParams) -> Result<ComposedStrip> {
    params.validate()?;

    let rects: Vec<CropRect> = frames.iter().map(|f| f.rect).collect();
    let bounds = SharedBounds::from_rects(&rects).ok_or(CompositionError::NoFrames)?;
    let scale = bounds.scale_factor(params.target_dimension)?;
    let (frame_width, frame_height) = scale.apply_pair(bounds.frame_extent());
    info!("Scaled frame extent: {}x{}", frame_width, frame_height);

    let resized: Vec<RgbaImage> = frames
        .iter()
        .map(|f| resize_frame(f.frame.as_image(), scale))
        .collect();

    let canvas_width = canvas_width(frame_width, frame_height, params, &resized)?;
    let mut canvas = RgbaImage::from_pixel(canvas_width, frame_height, CANVAS_FILL);

    let mut offsets = Vec::with_capacity(frames.len());
    let mut curr_offset: u32 = 0;

    for (i, (cropped, image)) in frames.iter().zip(&resized).enumerate() {
        let (left_crop, top_crop) = bounds.scaled_offset(&cropped.rect, scale);

        paste_masked(&mut canvas, image, curr_offset, top_crop);

        // Viewers of the sidecar expect the index subtracted. Never underflows:
        // every earlier frame advanced the offset by at least one.
        offsets.push(OffsetEntry {
            offset: curr_offset - i as u32,
            height: image.height(),
            left_crop,
        });

        debug!(
            "Frame {:03}: {}x{} at ({}, {}), left crop {}",
            i,
            image.width(),
            image.height(),
            curr_offset,
            top_crop,
            left_crop
        );

        curr_offset += image.width() + FRAME_GAP;
    }

    let canvas = imageops::crop_imm(&canvas, 0, 0, curr_offset, frame_height).to_image();
    info!(
        "Composed {} frames into a {}x{} strip",
        frames.len(),
        canvas.width(),
        canvas.height()
    );

    Ok(ComposedStrip {
        canvas,
        offsets,
        bounds,
        scale,
        frame_width,
        frame_height,
    })
}

/// Pre-allocated width, widened when the frames need more room than the
/// rotation counts promise
fn canvas_width(frame_width: u32, frame_height: u32, params: &StripParams, resized: &[RgbaImage]) -> Result<u32> {
    let slots = u64::from(params.y_rotations) * u64::from(params.x_rotations_total);
    let preallocated = (u64::from(frame_width) + u64::from(FRAME_GAP)) * slots;
    let required: u64 = resized
        .iter()
        .map(|img| u64::from(img.width()) + u64::from(FRAME_GAP))
        .sum();

    if required > preallocated {
        warn!(
            "{} frames need {}px but {} rotation slots only reserve {}px; widening canvas",
            resized.len(),
            required,
            slots,
            preallocated
        );
    }

    let width = preallocated.max(required);
    let bytes = width.saturating_mul(u64::from(frame_height)).saturating_mul(4);
    if bytes > MAX_CANVAS_BYTES {
        return Err(CompositionError::InvalidParameters {
            details: format!(
                "{}x{} canvas for {} rotation slots exceeds {} bytes",
                width, frame_height, slots, MAX_CANVAS_BYTES
            ),
        }
        .into());
    }

    u32::try_from(width).map_err(|_| {
        CompositionError::InvalidParameters {
            details: format!("canvas width {} exceeds u32", width),
        }
        .into()
    })
}

/// Resize by `scale` with a Lanczos filter, in premultiplied space so that
/// transparent pixels do not bleed colour into the edges of the model.
pub fn resize_frame(image: &RgbaImage, scale: ScaleFactor) -> RgbaImage {
    let width = scale.apply(image.width());
    let height = scale.apply(image.height());

    if width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }
    if (width, height) == image.dimensions() {
        return image.clone();
    }

    let mut premultiplied = image.clone();
    premultiply_in_place(&mut premultiplied);
    let mut resized = imageops::resize(&premultiplied, width, height, FilterType::Lanczos3);
    unpremultiply_in_place(&mut resized);
    resized
}

/// Paste `src` onto `dst` at (x, y) using the source alpha as the mask.
///
/// Every channel, alpha included, is blended as
/// `dst * (255 - mask) / 255 + src * mask / 255`, so fully transparent source
/// pixels leave the canvas untouched. Anything outside `dst` is clipped.
pub fn paste_masked(dst: &mut RgbaImage, src: &RgbaImage, x: u32, y: u32) {
    let (dst_width, dst_height) = dst.dimensions();
    if x >= dst_width || y >= dst_height {
        return;
    }
    let width = src.width().min(dst_width - x);
    let height = src.height().min(dst_height - y);

    for sy in 0..height {
        for sx in 0..width {
            let s = src.get_pixel(sx, sy);
            let mask = u32::from(s[3]);
            if mask == 0 {
                continue;
            }
            let d = dst.get_pixel_mut(x + sx, y + sy);
            if mask == 255 {
                *d = *s;
                continue;
            }
            for c in 0..4 {
                d[c] = div255(u32::from(d[c]) * (255 - mask) + u32::from(s[c]) * mask);
            }
        }
    }
}

/// Rounded division by 255 for values up to 255 * 255
fn div255(value: u32) -> u8 {
    let tmp = value + 128;
    (((tmp >> 8) + tmp) >> 8) as u8
}

fn premultiply_in_place(image: &mut RgbaImage) {
    for px in image.pixels_mut() {
        let a = u16::from(px[3]);
        for c in 0..3 {
            px[c] = ((u16::from(px[c]) * a + 127) / 255) as u8;
        }
    }
}

fn unpremultiply_in_place(image: &mut RgbaImage) {
    for px in image.pixels_mut() {
        let a = u16::from(px[3]);
        if a == 0 {
            continue;
        }
        for c in 0..3 {
            px[c] = ((u16::from(px[c]) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}
