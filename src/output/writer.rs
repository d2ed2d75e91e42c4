use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{OutputError, Result};

/// Replace whatever is at `path` with the bytes produced by `write`.
///
/// An existing file is removed first. If `write` fails the partially written
/// file is removed as well and the error is returned.
pub fn replace_file<F>(path: &Path, buffer_capacity: usize, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    if path.exists() {
        debug!("Removing existing output {:?}", path);
        std::fs::remove_file(path).map_err(|e| write_failed(path, e))?;
    }

    let file = File::create(path).map_err(|e| write_failed(path, e))?;
    let mut writer = BufWriter::with_capacity(buffer_capacity, file);

    let result = write(&mut writer).and_then(|()| {
        writer.flush().map_err(|e| write_failed(path, e))?;
        writer.get_ref().sync_all().map_err(|e| write_failed(path, e))
    });

    if let Err(e) = result {
        drop(writer);
        if let Err(remove_err) = std::fs::remove_file(path) {
            warn!("Could not remove partial output {:?}: {}", path, remove_err);
        }
        return Err(e);
    }

    Ok(())
}

fn write_failed(path: &Path, e: std::io::Error) -> crate::error::StitchError {
    OutputError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
    .into()
}
