use image::{ImageBuffer, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

/// A single decoded turntable render
///
/// Wraps an RGBA buffer. The alpha channel is what the cropper keys on, so
/// frames are always held as RGBA even when decoded from an opaque codec.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbaImage,
    source: Option<PathBuf>,
}

impl Frame {
    /// Create a new frame from an RGBA image buffer
    pub fn new(buffer: RgbaImage) -> Self {
        Self { buffer, source: None }
    }

    /// Create a frame that remembers which file it was decoded from
    pub fn with_source<P: Into<PathBuf>>(buffer: RgbaImage, source: P) -> Self {
        Self {
            buffer,
            source: Some(source.into()),
        }
    }

    /// Create a fully transparent frame
    pub fn new_transparent(width: u32, height: u32) -> Self {
        Self::new(ImageBuffer::from_pixel(width, height, Rgba([0, 0, 0, 0])))
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Path of the file this frame was decoded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Human-readable identifier used in logs and errors
    pub fn label(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => format!("<{}x{} in-memory frame>", self.width(), self.height()),
        }
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbaImage {
        &self.buffer
    }
}

#[cfg(test)]
impl Frame {
    pub(crate) fn as_image_mut(&mut self) -> &mut RgbaImage {
        &mut self.buffer
    }

    /// Fill an inclusive rectangle with one colour, clipped to the frame
    pub(crate) fn fill_rect(&mut self, rect: CropRect, color: [u8; 4]) {
        if self.width() == 0 || self.height() == 0 {
            return;
        }
        let right = rect.right.min(self.width().saturating_sub(1));
        let bottom = rect.bottom.min(self.height().saturating_sub(1));
        for y in rect.top..=bottom {
            for x in rect.left..=right {
                self.buffer.put_pixel(x, y, Rgba(color));
            }
        }
    }
}

/// Tightest box around every pixel with non-zero alpha
///
/// Coordinates are in the original, uncropped frame. `right` and `bottom`
/// are the last opaque column and row, not one past them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        debug_assert!(left <= right && top <= bottom);
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Width of the cropped raster (end-exclusive at `right`)
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    /// Height of the cropped raster (end-exclusive at `bottom`)
    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// A frame after pass 1: its crop rectangle plus the cropped pixels
#[derive(Debug, Clone)]
pub struct CroppedFrame {
    pub rect: CropRect,
    pub frame: Frame,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_frame() {
        let frame = Frame::new_transparent(4, 3);
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 3);
        assert!(frame.as_image().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_fill_rect_is_inclusive_and_clipped() {
        let mut frame = Frame::new_transparent(10, 10);
        frame.fill_rect(CropRect::new(8, 8, 20, 20), [1, 2, 3, 255]);

        assert_eq!(frame.as_image().get_pixel(8, 8)[3], 255);
        assert_eq!(frame.as_image().get_pixel(9, 9)[3], 255);
        assert_eq!(frame.as_image().get_pixel(7, 9)[3], 0);
    }

    #[test]
    fn test_crop_rect_extent_is_end_exclusive() {
        let rect = CropRect::new(10, 20, 90, 95);
        assert_eq!(rect.width(), 80);
        assert_eq!(rect.height(), 75);
    }

    #[test]
    fn test_label_prefers_source_path() {
        let frame = Frame::with_source(RgbaImage::new(1, 1), "tmp/render01.png");
        assert_eq!(frame.label(), "tmp/render01.png");
        assert!(Frame::new_transparent(2, 2).label().contains("2x2"));
    }
}
