use crate::error::{Error, Result};
use crate::filter::{ExclusionConfig, ExclusionSet};
use std::path::PathBuf;

const DEFAULT_GIT_PROGRAM: &str = "git";

/// Output format for the generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain text: tree, separator, then `<path>`-tagged file blocks
    #[default]
    Plain,
    /// Markdown with fenced code blocks
    Markdown,
    /// JSON document with tree lines and files
    Json,
}

impl OutputFormat {
    /// Returns the template name for this format.
    #[must_use]
    pub const fn template_name(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Markdown => "markdown",
            Self::Json => "json",
        }
    }
}

/// Where the repository comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Clone this URL into a temporary directory
    Remote(String),
    /// Use an existing local directory as-is
    Local(PathBuf),
}

impl Default for Source {
    fn default() -> Self {
        Self::Local(PathBuf::from("."))
    }
}

/// Options passed to the git executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOptions {
    /// Program to run
    pub program: String,

    /// Shallow clone depth
    pub depth: Option<u32>,

    /// Branch or tag to check out
    pub branch: Option<String>,
}

impl Default for GitOptions {
    fn default() -> Self {
        Self {
            program: DEFAULT_GIT_PROGRAM.to_string(),
            depth: None,
            branch: None,
        }
    }
}

/// Configuration for the repo-extract pipeline.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Repository to extract
    pub source: Source,

    /// Output format
    pub format: OutputFormat,

    /// Name-based exclusion rules
    pub exclusions: ExclusionConfig,

    /// Write the document here instead of only returning it
    pub output_file: Option<PathBuf>,

    /// git invocation options
    pub git: GitOptions,

    /// Path to external template file
    pub template_path: Option<PathBuf>,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use repo_extract::{Config, OutputFormat};
    ///
    /// let config = Config::builder()
    ///     .repository("https://github.com/rust-lang/log.git")
    ///     .format(OutputFormat::Markdown)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// The repository URL itself is checked later, when it is cloned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Local root directory doesn't exist or is not a directory
    /// - Clone depth is zero
    /// - Git program or branch is empty
    /// - Exclusion patterns don't compile
    /// - Template file is missing or invalid
    pub fn validate(&self) -> Result<()> {
        if let Source::Local(root) = &self.source {
            if !root.exists() {
                return Err(Error::config(format!(
                    "Root directory does not exist: {}",
                    root.display()
                )));
            }

            if !root.is_dir() {
                return Err(Error::config(format!(
                    "Root path is not a directory: {}",
                    root.display()
                )));
            }
        }

        if self.git.depth == Some(0) {
            return Err(Error::config("clone depth must be greater than 0"));
        }

        if self.git.program.trim().is_empty() {
            return Err(Error::config("git program must not be empty"));
        }

        if self.git.branch.as_deref().is_some_and(|b| b.trim().is_empty()) {
            return Err(Error::config("branch name must not be empty"));
        }

        ExclusionSet::new(&self.exclusions)?;

        if let Some(ref template_path) = self.template_path {
            if !template_path.is_file() {
                return Err(Error::config(format!(
                    "Template file does not exist: {}",
                    template_path.display()
                )));
            }

            if self.format == OutputFormat::Json {
                return Err(Error::config(
                    "A custom template cannot be combined with the JSON format",
                ));
            }

            crate::template::TemplateEngine::check_template_file(template_path)?;
        }

        if let Some(ref output) = self.output_file {
            if output.is_dir() {
                return Err(Error::config(format!(
                    "Output path is a directory: {}",
                    output.display()
                )));
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: Source::default(),
            format: OutputFormat::Plain,
            exclusions: ExclusionConfig::default(),
            output_file: None,
            git: GitOptions::default(),
            template_path: None,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    source: Option<Source>,
    format: Option<OutputFormat>,
    exclusions: Option<ExclusionConfig>,
    output_file: Option<PathBuf>,
    git_program: Option<String>,
    depth: Option<u32>,
    branch: Option<String>,
    template_path: Option<PathBuf>,
}

impl ConfigBuilder {
    /// Clones the repository at `url`.
    #[must_use]
    pub fn repository(mut self, url: impl Into<String>) -> Self {
        self.source = Some(Source::Remote(url.into()));
        self
    }

    /// Formats an existing local directory instead of cloning.
    #[must_use]
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(Source::Local(path.into()));
        self
    }

    /// Sets the source directly.
    #[must_use]
    pub fn source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the exclusion rules.
    #[must_use]
    pub fn exclusions(mut self, config: ExclusionConfig) -> Self {
        self.exclusions = Some(config);
        self
    }

    /// Writes the document to this file.
    #[must_use]
    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Sets the git executable.
    #[must_use]
    pub fn git_program(mut self, program: impl Into<String>) -> Self {
        self.git_program = Some(program.into());
        self
    }

    /// Makes a shallow clone with the given depth.
    #[must_use]
    pub const fn depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Checks out this branch or tag.
    #[must_use]
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Sets the path to an external template file.
    ///
    /// The template replaces the built-in one of the selected format and
    /// must contain valid Tera syntax.
    #[must_use]
    pub fn template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            source: self.source.unwrap_or_default(),
            format: self.format.unwrap_or_default(),
            exclusions: self.exclusions.unwrap_or_default(),
            output_file: self.output_file,
            git: GitOptions {
                program: self
                    .git_program
                    .unwrap_or_else(|| DEFAULT_GIT_PROGRAM.to_string()),
                depth: self.depth,
                branch: self.branch,
            },
            template_path: self.template_path,
        };

        config.validate()?;
        Ok(config)
    }
}
