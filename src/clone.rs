//! Repository materialization.
//!
//! Turns a repository URL into a local working tree by running `git clone`
//! into a fresh temporary directory. The directory lives as long as the
//! returned [`Checkout`] and is deleted when it is dropped.

use crate::config::GitOptions;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;
use tracing::{debug, info};

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "ssh", "git", "file"];

/// Produces a local working tree for a repository URL.
pub trait Materializer {
    /// Makes the repository at `url` available on disk.
    ///
    /// # Errors
    ///
    /// Returns a materialization error if the URL is rejected or the
    /// repository cannot be fetched.
    fn materialize(&self, url: &str) -> Result<Checkout>;
}

/// A materialized working tree.
#[derive(Debug)]
pub struct Checkout {
    root: PathBuf,
    _workspace: Option<TempDir>,
}

impl Checkout {
    /// Wraps a clone living inside a temporary directory that is removed on drop.
    #[must_use]
    pub fn temporary(root: PathBuf, workspace: TempDir) -> Self {
        Self {
            root,
            _workspace: Some(workspace),
        }
    }

    /// Wraps a directory that is left untouched on drop.
    #[must_use]
    pub fn borrowed(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            _workspace: None,
        }
    }

    /// Root of the working tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Clones with the `git` command-line client.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    options: GitOptions,
}

impl GitCli {
    /// Creates a materializer with the given git options.
    #[must_use]
    pub const fn new(options: GitOptions) -> Self {
        Self { options }
    }

    fn clone_args(&self, url: &str, target: &Path) -> Vec<String> {
        let mut args = vec!["clone".to_string(), "--quiet".to_string()];
        if let Some(depth) = self.options.depth {
            args.push("--depth".to_string());
            args.push(depth.to_string());
        }
        if let Some(ref branch) = self.options.branch {
            args.push("--branch".to_string());
            args.push(branch.clone());
        }
        args.push("--".to_string());
        args.push(url.to_string());
        args.push(target.to_string_lossy().into_owned());
        args
    }
}

impl Materializer for GitCli {
    fn materialize(&self, url: &str) -> Result<Checkout> {
        let url = url.trim();
        validate_url(url)?;

        let workspace = tempfile::Builder::new()
            .prefix("repo-extract-")
            .tempdir()
            .map_err(|e| Error::io(std::env::temp_dir(), e))?;
        let target = workspace.path().join("repo");

        info!("Cloning {} into {}", url, target.display());
        let args = self.clone_args(url, &target);
        debug!("Running {} {}", self.options.program, args.join(" "));

        let output = Command::new(&self.options.program)
            .args(&args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::git_unavailable(&self.options.program, &e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = last_meaningful_line(&stderr)
                .map_or_else(|| format!("git exited with {}", output.status), str::to_string);
            return Err(Error::clone_failed(url, message));
        }

        if !target.is_dir() {
            return Err(Error::clone_failed(url, "git produced no working tree"));
        }

        Ok(Checkout::temporary(target, workspace))
    }
}

/// Rejects input that git could never clone.
///
/// Accepts URLs with a known scheme, scp-style `user@host:path` addresses
/// and paths to existing local directories.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] describing the problem.
pub fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(Error::invalid_url(url, "URL is empty"));
    }

    if url.chars().any(char::is_whitespace) {
        return Err(Error::invalid_url(url, "URL must not contain whitespace"));
    }

    if url.starts_with('-') {
        return Err(Error::invalid_url(url, "URL must not start with '-'"));
    }

    if url.contains("://") {
        let parsed = url::Url::parse(url).map_err(|e| Error::invalid_url(url, e.to_string()))?;
        if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
            return Err(Error::invalid_url(
                url,
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }
        if parsed.scheme() != "file" && parsed.host_str().is_none_or(str::is_empty) {
            return Err(Error::invalid_url(url, "URL has no host"));
        }
        return Ok(());
    }

    if is_scp_like(url) || Path::new(url).is_dir() {
        return Ok(());
    }

    Err(Error::invalid_url(
        url,
        "expected an http(s), ssh or git URL, user@host:path, or a local repository path",
    ))
}

/// `git@github.com:owner/repo.git`
fn is_scp_like(url: &str) -> bool {
    let Some((user_host, path)) = url.split_once(':') else {
        return false;
    };
    let host = user_host.rsplit('@').next().unwrap_or(user_host);
    !path.is_empty()
        && !host.is_empty()
        && !user_host.contains('/')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

fn last_meaningful_line(stderr: &str) -> Option<&str> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
}
