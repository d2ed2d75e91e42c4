use serde::{Deserialize, Serialize};
use std::io::Write;

use image::RgbaImage;

use crate::error::Result;

/// Core trait for composite image encoders
pub trait ImageEncoder: Send + Sync {
    /// Returns the unique name of this encoder
    fn name(&self) -> &str;

    /// File extension written for this encoder, without the dot
    fn extension(&self) -> &str;

    /// Whether the encoding preserves every pixel, alpha included
    fn is_lossless(&self) -> bool {
        true
    }

    /// Encode the composed canvas into `writer`
    ///
    /// # Arguments
    ///
    /// * `image` - The RGBA canvas to encode
    /// * `writer` - Destination of the encoded bytes
    /// * `settings` - Call-site encoder tuning
    fn encode(&self, image: &RgbaImage, writer: &mut dyn Write, settings: &EncoderSettings) -> Result<()>;
}

/// PNG deflate effort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    Default,
    #[default]
    Best,
}

impl From<PngCompression> for png::Compression {
    fn from(value: PngCompression) -> Self {
        match value {
            PngCompression::Fast => png::Compression::Fast,
            PngCompression::Default => png::Compression::Default,
            PngCompression::Best => png::Compression::Best,
        }
    }
}

/// Encoder tuning passed explicitly to every encode call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSettings {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,

    /// PNG compression level
    pub png_compression: PngCompression,

    /// Write block size; `None` sizes it from the canvas
    pub write_buffer_bytes: Option<usize>,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            png_compression: PngCompression::Best,
            write_buffer_bytes: None,
        }
    }
}

/// Smallest write buffer handed to an encoder
pub const MIN_BUFFER_BYTES: usize = 8 * 1024;

/// Ceiling on the derived write buffer. The buffer is allocated up front.
pub const MAX_DEFAULT_BUFFER_BYTES: usize = 1 << 20;

impl EncoderSettings {
    /// Bytes to buffer before flushing to disk for a canvas of this size.
    ///
    /// An explicit `write_buffer_bytes` is used as given (at least
    /// [`MIN_BUFFER_BYTES`]); otherwise 16 bytes per canvas pixel, capped at
    /// [`MAX_DEFAULT_BUFFER_BYTES`].
    pub fn buffer_capacity(&self, width: u32, height: u32) -> usize {
        self.write_buffer_bytes
            .unwrap_or_else(|| {
                (width as usize)
                    .saturating_mul(height as usize)
                    .saturating_mul(16)
                    .min(MAX_DEFAULT_BUFFER_BYTES)
            })
            .max(MIN_BUFFER_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_buffer_scales_with_canvas_up_to_cap() {
        let settings = EncoderSettings::default();
        assert_eq!(settings.buffer_capacity(10, 10), MIN_BUFFER_BYTES);
        assert_eq!(settings.buffer_capacity(100, 100), 160_000);
        // A 48 frame strip would otherwise reserve ~43 MB
        assert_eq!(settings.buffer_capacity(13_500, 200), MAX_DEFAULT_BUFFER_BYTES);
    }

    #[test]
    fn test_explicit_buffer_size_wins() {
        let settings = EncoderSettings {
            write_buffer_bytes: Some(4 << 20),
            ..EncoderSettings::default()
        };
        assert_eq!(settings.buffer_capacity(13_500, 200), 4 << 20);

        let tiny = EncoderSettings {
            write_buffer_bytes: Some(16),
            ..EncoderSettings::default()
        };
        assert_eq!(tiny.buffer_capacity(1, 1), MIN_BUFFER_BYTES);
    }

    #[test]
    fn test_png_compression_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            level: PngCompression,
        }
        let parsed: Wrapper = toml::from_str("level = \"fast\"").unwrap();
        assert_eq!(parsed.level, PngCompression::Fast);
    }
}
