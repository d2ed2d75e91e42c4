use std::collections::HashMap;

use crate::error::{OutputError, Result};
use crate::output::{ImageEncoder, JpegEncoder, PngEncoder};

type EncoderFactory = Box<dyn Fn() -> Box<dyn ImageEncoder> + Send + Sync>;

/// Registry of available composite encoders
///
/// Encoders are registered by lowercase name; lookups are case-insensitive so
/// both `PNG` and `png` resolve.
pub struct EncoderRegistry {
    encoders: HashMap<String, EncoderFactory>,
}

impl EncoderRegistry {
    /// Create a new registry with the built-in encoders
    pub fn new() -> Self {
        let mut registry = Self {
            encoders: HashMap::new(),
        };

        registry.register_builtin_encoders();
        registry
    }

    fn register_builtin_encoders(&mut self) {
        self.register("png", || Box::new(PngEncoder::new()));
        self.register("jpeg", || Box::new(JpegEncoder::new()));
        self.register("jpg", || Box::new(JpegEncoder::new()));
    }

    /// Register a custom encoder
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn ImageEncoder> + Send + Sync + 'static,
    {
        self.encoders.insert(name.to_lowercase(), Box::new(factory));
    }

    /// Get a new encoder instance by name
    pub fn get_encoder(&self, name: &str) -> Option<Box<dyn ImageEncoder>> {
        self.encoders.get(&name.to_lowercase()).map(|factory| factory())
    }

    /// Like [`get_encoder`](Self::get_encoder) but an unknown name is an error
    pub fn resolve(&self, name: &str) -> Result<Box<dyn ImageEncoder>> {
        self.get_encoder(name).ok_or_else(|| {
            OutputError::UnsupportedFormat {
                format: name.to_string(),
            }
            .into()
        })
    }

    /// All registered names, sorted
    pub fn available_formats(&self) -> Vec<String> {
        let mut names: Vec<String> = self.encoders.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_format(&self, name: &str) -> bool {
        self.encoders.contains_key(&name.to_lowercase())
    }
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_encoders_available() {
        let registry = EncoderRegistry::new();

        assert!(registry.has_format("png"));
        assert!(registry.has_format("JPEG"));
        assert!(registry.has_format("jpg"));
        assert_eq!(registry.available_formats(), ["jpeg", "jpg", "png"]);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = EncoderRegistry::new();

        let png = registry.get_encoder("PNG").unwrap();
        assert_eq!(png.name(), "png");
        assert!(png.is_lossless());

        assert_eq!(registry.get_encoder("Jpg").unwrap().name(), "jpeg");
        assert!(registry.get_encoder("webp").is_none());
        assert!(registry.resolve("webp").is_err());
    }

    #[test]
    fn test_custom_encoder_registration() {
        let mut registry = EncoderRegistry::new();
        registry.register("lossless", || Box::new(PngEncoder::new()));

        assert!(registry.has_format("lossless"));
        assert_eq!(registry.resolve("LOSSLESS").unwrap().extension(), "png");
    }
}
