use std::io::Write;

use image::RgbaImage;
use tracing::debug;

use crate::error::{OutputError, Result};
use crate::output::traits::{EncoderSettings, ImageEncoder};

/// Lossless RGBA PNG output
pub struct PngEncoder;

impl PngEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PngEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageEncoder for PngEncoder {
    fn name(&self) -> &str {
        "png"
    }

    fn extension(&self) -> &str {
        "png"
    }

    fn encode(&self, image: &RgbaImage, writer: &mut dyn Write, settings: &EncoderSettings) -> Result<()> {
        let failed = |e: png::EncodingError| OutputError::EncodingFailed {
            reason: format!("PNG: {}", e),
        };

        debug!(
            "Encoding {}x{} PNG ({:?} compression)",
            image.width(),
            image.height(),
            settings.png_compression
        );

        let mut encoder = png::Encoder::new(writer, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(settings.png_compression.into());

        let mut png_writer = encoder.write_header().map_err(failed)?;
        png_writer.write_image_data(image.as_raw()).map_err(failed)?;
        png_writer.finish().map_err(failed)?;
        Ok(())
    }
}
