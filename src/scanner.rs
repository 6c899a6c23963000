use crate::{
    error::{Error, Result},
    file::{read_text, FileData, SkipReason},
    filter::NameFilter,
    tree::{render_tree, TreeNode},
};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

/// Statistics collected during scanning.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Directories listed in the tree
    pub directories: usize,

    /// Files listed in the tree
    pub files: usize,

    /// Files with a content block
    pub text_files: usize,

    /// Files skipped as binary
    pub binary_files: usize,

    /// Files skipped because they could not be read or decoded
    pub unreadable_files: usize,

    /// Symbolic links listed without content
    pub symlinks: usize,

    /// Entries the walk could not visit
    pub walk_errors: usize,

    /// Total bytes of content collected
    pub content_bytes: u64,
}

/// Result of walking a repository root.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Visited entries in depth-first, name-sorted order
    pub nodes: Vec<TreeNode>,

    /// Rendered tree, one `\n`-terminated line per node
    pub tree: String,

    /// Readable text files in tree order
    pub files: Vec<FileData>,

    /// Counters gathered while scanning
    pub stats: ScanStats,
}

/// Walks a directory and collects the tree and the file contents.
pub(crate) struct Scanner<'a> {
    filter: &'a dyn NameFilter,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner using the given exclusion predicate.
    pub(crate) fn new(filter: &'a dyn NameFilter) -> Self {
        Self { filter }
    }

    /// Scans `root` and returns the snapshot.
    ///
    /// Unreadable files are counted and skipped; an empty root yields an
    /// empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` does not exist or is not a directory.
    pub(crate) fn scan(&self, root: &Path) -> Result<Snapshot> {
        let metadata = std::fs::metadata(root).map_err(|e| Error::io(root, e))?;
        if !metadata.is_dir() {
            return Err(Error::config(format!(
                "Root path is not a directory: {}",
                root.display()
            )));
        }

        debug!("Starting scan of {}", root.display());

        let mut stats = ScanStats::default();
        let nodes = self.walk(root, &mut stats);

        let mut files = Vec::new();
        for node in nodes.iter().filter(|n| !n.is_dir) {
            // a link may point outside the root
            let read = if node.is_symlink {
                Err(SkipReason::Symlink)
            } else {
                read_text(&node.path)
            };
            match read {
                Ok(content) => {
                    stats.text_files += 1;
                    stats.content_bytes += content.len() as u64;
                    files.push(FileData::new(
                        node.path.clone(),
                        node.relative_path.clone(),
                        content,
                    ));
                }
                Err(reason) => {
                    debug!("Skipping content of {}: {}", node.relative_path, reason);
                    match reason {
                        SkipReason::Binary => stats.binary_files += 1,
                        SkipReason::Symlink => stats.symlinks += 1,
                        SkipReason::InvalidUtf8 | SkipReason::Io(_) => {
                            stats.unreadable_files += 1;
                        }
                    }
                }
            }
        }

        debug!(
            "Scan complete: {} dirs, {} files, {} text, {} binary, {} unreadable, {} symlinks, {} walk errors",
            stats.directories,
            stats.files,
            stats.text_files,
            stats.binary_files,
            stats.unreadable_files,
            stats.symlinks,
            stats.walk_errors
        );

        Ok(Snapshot {
            tree: render_tree(&nodes),
            nodes,
            files,
            stats,
        })
    }

    /// Depth-first walk with siblings sorted by name.
    fn walk(&self, root: &Path, stats: &mut ScanStats) -> Vec<TreeNode> {
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry));

        let mut nodes = Vec::new();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error: {}", e);
                    stats.walk_errors += 1;
                    continue;
                }
            };

            let is_dir = entry.file_type().is_dir();
            let node = TreeNode {
                path: entry.path().to_path_buf(),
                relative_path: relative_path(entry.path(), root),
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
                is_symlink: entry.path_is_symlink(),
                depth: entry.depth(),
            };
            trace!("Visited {}", node.relative_path);

            if is_dir {
                stats.directories += 1;
            } else {
                stats.files += 1;
            }
            nodes.push(node);
        }

        nodes
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        let excluded = self.filter.is_excluded(&name, entry.file_type().is_dir());
        if excluded {
            trace!("Excluded {}", entry.path().display());
        }
        excluded
    }
}

/// Root-relative path with `/` separators on every platform.
fn relative_path(path: &Path, root: &Path) -> String {
    let relative = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
