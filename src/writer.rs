use crate::error::{Error, Result};
use std::{
    ffi::OsString,
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Persists the finished document.
pub(crate) struct Writer {
    path: PathBuf,
}

impl Writer {
    /// Creates a writer targeting `path`.
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Writes the document atomically.
    ///
    /// # Process
    ///
    /// 1. Creates missing parent directories
    /// 2. Writes content to a temporary sibling file
    /// 3. Syncs the temporary file to disk
    /// 4. Renames it over the target path
    ///
    /// A reader never observes a half-written document.
    ///
    /// # Errors
    ///
    /// Returns an error if any filesystem operation fails.
    pub(crate) fn write(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let temp_path = temp_path_for(&self.path);
        let mut temp_file =
            fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| Error::io(&temp_path, e))?;

        temp_file
            .sync_all()
            .map_err(|e| Error::io(&temp_path, e))?;

        drop(temp_file);

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::io(&self.path, e));
        }

        debug!("Renamed {} to {}", temp_path.display(), self.path.display());
        info!("Wrote {} bytes to {}", content.len(), self.path.display());
        Ok(())
    }
}

/// `out/doc.txt` -> `out/doc.txt.tmp`
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("document"), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}
