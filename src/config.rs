use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    output::{sidecar, PngCompression},
};

/// Main configuration for the turntable stitcher
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Strip geometry and frame layout
    pub layout: LayoutConfig,

    /// Composite image and sidecar output
    pub output: OutputConfig,

    /// Sidecar template settings
    pub sidecar: SidecarConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        self.output.validate()?;
        self.sidecar.validate()?;
        Ok(())
    }
}

/// Strip layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Long edge of a normalized frame, in pixels
    pub target_dimension: u32,

    /// Camera tilt steps on each side of level
    pub x_rotations: u32,

    /// Turntable steps; derived from the frame count when unset
    pub y_rotations: Option<u32>,

    /// Worker threads for decoding and cropping
    pub decode_threads: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            target_dimension: 280,
            x_rotations: 1,
            y_rotations: None,
            decode_threads: num_cpus::get(),
        }
    }
}

impl LayoutConfig {
    /// Tilt positions per turntable step: level plus each side
    pub fn x_rotations_total(&self) -> u32 {
        self.checked_x_rotations_total().unwrap_or(u32::MAX)
    }

    fn checked_x_rotations_total(&self) -> Option<u32> {
        self.x_rotations.checked_mul(2)?.checked_add(1)
    }

    /// Turntable steps for `frame_count` rendered frames, at least one
    pub fn y_rotations_for(&self, frame_count: usize) -> u32 {
        self.y_rotations.unwrap_or_else(|| {
            let steps = frame_count / self.x_rotations_total() as usize;
            u32::try_from(steps).unwrap_or(u32::MAX).max(1)
        })
    }

    fn validate(&self) -> Result<()> {
        if self.target_dimension == 0 {
            return Err(ConfigError::InvalidValue {
                key: "layout.target_dimension".to_string(),
                value: self.target_dimension.to_string()
            }.into());
        }

        let Some(x_rotations_total) = self.checked_x_rotations_total() else {
            return Err(ConfigError::InvalidValue {
                key: "layout.x_rotations".to_string(),
                value: self.x_rotations.to_string()
            }.into());
        };

        // Rotation slots size the pre-allocated strip and must fit in u32
        if let Some(y_rotations) = self.y_rotations {
            if y_rotations == 0 || y_rotations.checked_mul(x_rotations_total).is_none() {
                return Err(ConfigError::InvalidValue {
                    key: "layout.y_rotations".to_string(),
                    value: y_rotations.to_string()
                }.into());
            }
        }

        if self.decode_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "layout.decode_threads".to_string(),
                value: self.decode_threads.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Output artifact configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Encoder name (png, jpeg)
    pub format: String,

    /// Composite image file name without extension
    pub image_stem: String,

    /// Sidecar file name
    pub sidecar_name: String,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,

    /// PNG compression level
    pub png_compression: PngCompression,

    /// Encoder write block size; defaults to 16 bytes per canvas pixel, capped at 1 MiB
    pub write_buffer_bytes: Option<usize>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "png".to_string(),
            image_stem: "weapon".to_string(),
            sidecar_name: "weaponoffsets.txt".to_string(),
            jpeg_quality: 90,
            png_compression: PngCompression::Best,
            write_buffer_bytes: None,
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::InvalidValue {
                key: "output.jpeg_quality".to_string(),
                value: self.jpeg_quality.to_string()
            }.into());
        }

        for (key, name) in [("output.image_stem", &self.image_stem), ("output.sidecar_name", &self.sidecar_name)] {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: name.clone()
                }.into());
            }
        }

        if self.write_buffer_bytes == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "output.write_buffer_bytes".to_string(),
                value: "0".to_string()
            }.into());
        }

        Ok(())
    }
}

/// Sidecar template configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidecarConfig {
    /// Image URL written before the cache-busting timestamp
    pub url: String,

    /// Frame the viewer shows first
    pub start_frame: u32,

    /// Wiki markup with `${name}` placeholders
    pub template: String,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            url: "url".to_string(),
            start_frame: 16,
            template: sidecar::DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl SidecarConfig {
    fn validate(&self) -> Result<()> {
        sidecar::check_template(&self.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layout.target_dimension, 280);
        assert_eq!(config.layout.x_rotations_total(), 3);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.layout.y_rotations = Some(16);
        original_config.output.format = "jpeg".to_string();

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[layout]\ntarget_dimension = 512\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.layout.target_dimension, 512);
        assert_eq!(config.layout.x_rotations, 1);
        assert_eq!(config.output.image_stem, "weapon");
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let dir = tempdir().unwrap();
        assert!(Config::from_file(dir.path().join("absent.toml")).is_err());

        let file_path = dir.path().join("broken.toml");
        std::fs::write(&file_path, "[layout\n").unwrap();
        assert!(Config::from_file(&file_path).is_err());
    }

    #[test]
    fn test_y_rotations_derived_from_frame_count() {
        let mut layout = LayoutConfig::default();
        assert_eq!(layout.y_rotations_for(48), 16);
        assert_eq!(layout.y_rotations_for(2), 1);

        layout.y_rotations = Some(4);
        assert_eq!(layout.y_rotations_for(48), 4);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = Config::default();
        config.layout.target_dimension = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.jpeg_quality = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.image_stem = "../weapon".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sidecar.template = "${nonsense}".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rotation_counts_that_overflow_are_rejected() {
        let mut config = Config::default();
        config.layout.x_rotations = 3_000_000_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("layout.x_rotations"));
        assert_eq!(config.layout.x_rotations_total(), u32::MAX);

        let mut config = Config::default();
        config.layout.x_rotations = (u32::MAX - 1) / 2;
        assert!(config.validate().is_ok());
        assert_eq!(config.layout.x_rotations_total(), u32::MAX);

        let mut config = Config::default();
        config.layout.y_rotations = Some(u32::MAX / 2);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("layout.y_rotations"));
    }
}
