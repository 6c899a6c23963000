use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

static BINARY_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "exe", "dll", "so", "dylib", "a", "o", "obj", "png", "jpg", "jpeg", "gif", "bmp", "ico",
        "webp", "mp3", "mp4", "avi", "mkv", "mov", "wav", "flac", "pdf", "doc", "docx", "xls",
        "xlsx", "ppt", "pptx", "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "wasm", "pyc",
        "class", "jar", "ttf", "otf", "woff", "woff2", "eot", "sqlite", "db", "bin",
    ]
    .into_iter()
    .collect()
});

/// A file whose content made it into the document.
#[derive(Debug, Clone, Serialize)]
pub struct FileData {
    /// Absolute path to the file
    #[serde(skip)]
    pub absolute_path: PathBuf,

    /// Path relative to the repository root, `/`-separated
    #[serde(rename = "path")]
    pub relative_path: String,

    /// Full UTF-8 content
    pub content: String,
}

impl FileData {
    /// Creates a new file entry.
    #[must_use]
    pub const fn new(absolute_path: PathBuf, relative_path: String, content: String) -> Self {
        Self {
            absolute_path,
            relative_path,
            content,
        }
    }

    /// Returns the number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

/// Why a listed file has no content block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Known binary extension or NUL bytes in the leading sample
    Binary,
    /// Content is not valid UTF-8
    InvalidUtf8,
    /// The entry is a symbolic link and its target is not read
    Symlink,
    /// The file could not be read
    Io(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary => f.write_str("binary file"),
            Self::InvalidUtf8 => f.write_str("invalid UTF-8"),
            Self::Symlink => f.write_str("symbolic link"),
            Self::Io(message) => write!(f, "read error: {message}"),
        }
    }
}

impl From<io::Error> for SkipReason {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::InvalidData {
            Self::InvalidUtf8
        } else {
            Self::Io(e.to_string())
        }
    }
}

/// Reads a file as text.
///
/// Binary and undecodable files are reported as a [`SkipReason`] instead of
/// an error so that a single bad file never aborts the extraction.
pub(crate) fn read_text(path: &Path) -> std::result::Result<String, SkipReason> {
    if has_binary_extension(path) {
        return Err(SkipReason::Binary);
    }

    if is_likely_binary(path)? {
        return Err(SkipReason::Binary);
    }

    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes).map_err(|_| SkipReason::InvalidUtf8)
}

/// Determines if a file is likely binary by looking for NUL bytes in the
/// first 8KB.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub(crate) fn is_likely_binary(path: &Path) -> io::Result<bool> {
    const BUFFER_SIZE: usize = 8192;

    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut buffer = [0u8; BUFFER_SIZE];

    let bytes_read = reader.read(&mut buffer)?;
    if bytes_read == 0 {
        return Ok(false);
    }

    Ok(memchr::memchr(0, &buffer[..bytes_read]).is_some())
}

/// Checks if a file extension suggests a binary file.
#[must_use]
pub(crate) fn has_binary_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| BINARY_EXTENSIONS.contains(ext.to_lowercase().as_str()))
}
