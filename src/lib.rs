//! # repo-extract
//!
//! Turns a git repository into a single text document (a file tree followed
//! by the contents of every text file) ready to paste into an LLM prompt.
//!
//! ## Features
//!
//! - Clones any URL the `git` client accepts into a throwaway directory
//! - Deterministic, name-sorted tree rendering with branch markers
//! - Case-insensitive name exclusions (hidden files, `README*`, ...)
//! - Binary and undecodable files stay in the tree but get no content block
//! - Plain text, Markdown and JSON output, or a custom Tera template
//!
//! ## Quick Start
//!
//! ```no_run
//! use repo_extract::{Config, OutputFormat, Pipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .repository("https://github.com/rust-lang/log.git")
//!     .format(OutputFormat::Markdown)
//!     .depth(1)
//!     .build()?;
//!
//! let extraction = Pipeline::new(config)?.run()?;
//! println!("{}", extraction.document);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Materializer**: clones the repository into a temporary directory
//! 2. **Scanner**: walks the tree, applying exclusions, and reads files
//! 3. **Template engine**: renders the tree and file blocks
//! 4. **Writer**: optionally persists the document

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod clone;
mod config;
mod error;
mod file;
mod filter;
mod pipeline;
mod scanner;
mod template;
mod tree;
mod writer;

use std::path::Path;

pub use clone::{validate_url, Checkout, GitCli, Materializer};
pub use config::{Config, ConfigBuilder, GitOptions, OutputFormat, Source};
pub use error::{Error, Result};
pub use file::{FileData, SkipReason};
pub use filter::{ExclusionConfig, ExclusionSet, NameFilter, NamePattern};
pub use pipeline::{ExtractStats, Extraction, Pipeline};
pub use scanner::{ScanStats, Snapshot};
pub use tree::{render_lines, render_tree, TreeNode};

/// Runs the complete pipeline with the given configuration.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - The repository cannot be cloned
/// - The root directory is inaccessible
/// - Rendering or writing the output fails
pub fn run(config: Config) -> Result<Extraction> {
    Pipeline::new(config)?.run()
}

/// Clones `url` and returns the plain-text document using the default
/// exclusion policy.
///
/// # Errors
///
/// Returns a materialization error if the repository cannot be cloned.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> repo_extract::Result<()> {
/// let document = repo_extract::extract_repo("https://github.com/rust-lang/log.git")?;
/// print!("{document}");
/// # Ok(())
/// # }
/// ```
pub fn extract_repo(url: &str) -> Result<String> {
    let config = Config::builder().repository(url).build()?;
    Ok(run(config)?.document)
}

/// Scans a local directory and returns its snapshot.
///
/// # Errors
///
/// Returns an error if `root` is missing or not a directory.
pub fn scan_dir(root: &Path, filter: &dyn NameFilter) -> Result<Snapshot> {
    scanner::Scanner::new(filter).scan(root)
}

/// Formats a local directory as a plain-text document.
///
/// The result depends only on the directory contents and `filter`, so
/// formatting an unchanged directory twice yields identical output.
///
/// # Errors
///
/// Returns an error if `root` is missing or not a directory.
///
/// # Examples
///
/// ```no_run
/// use repo_extract::{format_dir, ExclusionSet};
/// use std::path::Path;
///
/// # fn main() -> repo_extract::Result<()> {
/// let document = format_dir(Path::new("."), &ExclusionSet::default())?;
/// print!("{document}");
/// # Ok(())
/// # }
/// ```
pub fn format_dir(root: &Path, filter: &dyn NameFilter) -> Result<String> {
    let snapshot = scan_dir(root, filter)?;
    template::TemplateEngine::new(OutputFormat::Plain, None)?.render(&snapshot)
}
