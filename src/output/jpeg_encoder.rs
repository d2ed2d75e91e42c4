use std::io::Write;

use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::{ColorType, DynamicImage, RgbaImage};
use tracing::debug;

use crate::error::{OutputError, Result};
use crate::output::traits::{EncoderSettings, ImageEncoder};

/// Lossy photographic output
///
/// JPEG has no alpha, so the channel is discarded without blending and
/// unpainted areas show the canvas fill colour.
pub struct JpegEncoder;

impl JpegEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageEncoder for JpegEncoder {
    fn name(&self) -> &str {
        "jpeg"
    }

    fn extension(&self) -> &str {
        "jpeg"
    }

    fn is_lossless(&self) -> bool {
        false
    }

    fn encode(&self, image: &RgbaImage, writer: &mut dyn Write, settings: &EncoderSettings) -> Result<()> {
        debug!(
            "Encoding {}x{} JPEG at quality {}",
            image.width(),
            image.height(),
            settings.jpeg_quality
        );

        let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
        let mut encoder = ImageJpegEncoder::new_with_quality(writer, settings.jpeg_quality);
        encoder
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            .map_err(|e| OutputError::EncodingFailed {
                reason: format!("JPEG: {}", e),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_transparent_canvas_becomes_white() {
        let image = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 0]));

        let mut bytes = Vec::new();
        JpegEncoder::new()
            .encode(&image, &mut bytes, &EncoderSettings::default())
            .unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (16, 16));
        assert!(decoded.pixels().all(|p| p[0] > 250 && p[1] > 250 && p[2] > 250));
    }

    #[test]
    fn test_jpeg_is_lossy() {
        assert!(!JpegEncoder::new().is_lossless());
        assert_eq!(JpegEncoder::new().extension(), "jpeg");
    }
}
