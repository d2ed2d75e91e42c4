use thiserror::Error;

/// Main error type for the turntable stitcher
#[derive(Error, Debug)]
pub enum StitchError {
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Composition error: {0}")]
    Composition(#[from] CompositionError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Errors raised while discovering, decoding or cropping input frames
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Failed to load frame: {path} ({reason})")]
    LoadFailed { path: String, reason: String },

    #[error("No frame images found in directory: {path}")]
    NoFramesFound { path: String },

    #[error("Frame has no opaque pixels: {frame}")]
    EmptyFrame { frame: String },

    #[error("Invalid raster: {reason}")]
    InvalidRaster { reason: String },
}

/// Errors raised while building the strip
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("No frames to compose")]
    NoFrames,

    #[error("Shared bounds have zero extent: ({left}, {top}, {right}, {bottom})")]
    DegenerateBounds {
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
    },

    #[error("Invalid composition parameters: {details}")]
    InvalidParameters { details: String },
}

/// Errors raised while encoding or writing artifacts
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Unsupported output format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Image encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using StitchError
pub type Result<T> = std::result::Result<T, StitchError>;

impl StitchError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Frame(FrameError::EmptyFrame { frame }) => {
                format!(
                    "Frame '{}' is fully transparent. Every render must show the model against a transparent background.",
                    frame
                )
            }
            Self::Frame(FrameError::NoFramesFound { path }) => {
                format!("No PNG or JPEG frames found in '{}'.", path)
            }
            Self::Composition(CompositionError::DegenerateBounds { .. }) => {
                "All frames crop to a single point, so there is nothing to scale.".to_string()
            }
            Self::Output(OutputError::UnsupportedFormat { format }) => {
                format!("Output format '{}' is not supported. Available formats: png, jpeg", format)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
