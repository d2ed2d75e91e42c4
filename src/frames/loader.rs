use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{FrameError, Result};
use crate::frames::types::Frame;

/// Discovers and decodes the rendered frames of one turntable run
///
/// Renders are named with their step indices embedded (`render%d%d.png`), so
/// presentation order is the integer formed by all digits in the file name.
pub struct FrameLoader;

impl FrameLoader {
    /// List, order and decode every frame image in `directory`
    pub fn load_directory<P: AsRef<Path>>(directory: P) -> Result<Vec<Frame>> {
        let paths = Self::frame_paths(directory)?;

        let results: Vec<Result<Frame>> = paths.par_iter().map(Self::load_frame).collect();
        let frames = results.into_iter().collect::<Result<Vec<_>>>()?;

        info!("Decoded {} frames", frames.len());
        Ok(frames)
    }

    /// Candidate frame files in presentation order
    pub fn frame_paths<P: AsRef<Path>>(directory: P) -> Result<Vec<PathBuf>> {
        let directory = directory.as_ref();

        if !directory.is_dir() {
            return Err(FrameError::LoadFailed {
                path: directory.display().to_string(),
                reason: "not a directory".to_string(),
            }
            .into());
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            if path.is_file() && !Self::is_hidden_file(&path) && Self::is_supported(&path) {
                paths.push(path);
            } else {
                debug!("Skipping {:?}", path);
            }
        }

        if paths.is_empty() {
            return Err(FrameError::NoFramesFound {
                path: directory.display().to_string(),
            }
            .into());
        }

        paths.sort_by(|a, b| Self::compare_frame_names(a, b));
        Ok(paths)
    }

    /// Decode a single frame into RGBA8
    pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<Frame> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| FrameError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let rgba = match image {
            image::DynamicImage::ImageRgba8(img) => img,
            _ => image.to_rgba8(),
        };

        debug!("Loaded {:?} ({}x{})", path, rgba.width(), rgba.height());
        Ok(Frame::with_source(rgba, path))
    }

    /// The integer spelled by every ASCII digit in the file name
    pub fn sequence_number(path: &Path) -> Option<u64> {
        let name = path.file_name()?.to_str()?;
        let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }

    fn compare_frame_names(a: &Path, b: &Path) -> Ordering {
        match (Self::sequence_number(a), Self::sequence_number(b)) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.file_name().cmp(&b.file_name())),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.file_name().cmp(&b.file_name()),
        }
    }

    pub fn is_supported<P: AsRef<Path>>(path: P) -> bool {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) => matches!(ext.to_lowercase().as_str(), "png" | "jpg" | "jpeg"),
            None => false,
        }
    }

    fn is_hidden_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
    }
}
