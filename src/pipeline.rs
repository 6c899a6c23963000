use crate::{
    clone::{Checkout, GitCli, Materializer},
    config::{Config, Source},
    error::Result,
    filter::ExclusionSet,
    scanner::{ScanStats, Scanner},
    template::TemplateEngine,
    writer::Writer,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Statistics collected during pipeline execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractStats {
    /// Directories listed in the tree
    pub directories: usize,

    /// Files listed in the tree
    pub files: usize,

    /// Files with a content block
    pub text_files: usize,

    /// Files left out of the content section as binary
    pub binary_files: usize,

    /// Files left out of the content section as unreadable
    pub unreadable_files: usize,

    /// Symbolic links listed without content
    pub symlinks: usize,

    /// Bytes of file content in the document
    pub content_bytes: u64,

    /// Size of the rendered document in bytes
    pub document_bytes: usize,

    /// Total execution time
    pub duration: Duration,

    /// Time spent cloning
    pub materialize_duration: Duration,

    /// Time spent walking and reading
    pub scan_duration: Duration,

    /// Time spent rendering
    pub render_duration: Duration,
}

impl ExtractStats {
    fn new(scan: &ScanStats, document_bytes: usize, timings: Timings) -> Self {
        Self {
            directories: scan.directories,
            files: scan.files,
            text_files: scan.text_files,
            binary_files: scan.binary_files,
            unreadable_files: scan.unreadable_files,
            symlinks: scan.symlinks,
            content_bytes: scan.content_bytes,
            document_bytes,
            duration: timings.total,
            materialize_duration: timings.materialize,
            scan_duration: timings.scan,
            render_duration: timings.render,
        }
    }

    /// Files that appear in the tree but have no content block.
    #[must_use]
    pub const fn skipped_files(&self) -> usize {
        self.binary_files + self.unreadable_files + self.symlinks
    }

    /// Prints a human-readable summary to stderr.
    pub fn print_summary(&self) {
        eprintln!("\n╔═══════════════════════════════════════════════════════╗");
        eprintln!("║              Extraction Summary                       ║");
        eprintln!("╠═══════════════════════════════════════════════════════╣");
        eprintln!(
            "║ Directories:          {:>8}                        ║",
            self.directories
        );
        eprintln!(
            "║ Files in tree:        {:>8}                        ║",
            self.files
        );
        eprintln!(
            "║   - With content:     {:>8}                        ║",
            self.text_files
        );
        eprintln!(
            "║   - Binary:           {:>8}                        ║",
            self.binary_files
        );
        eprintln!(
            "║   - Unreadable:       {:>8}                        ║",
            self.unreadable_files
        );
        eprintln!(
            "║   - Symlinks:         {:>8}                        ║",
            self.symlinks
        );
        eprintln!("║                                                       ║");
        eprintln!(
            "║ Document size:        {:>8} bytes                  ║",
            self.document_bytes
        );
        eprintln!("║                                                       ║");
        eprintln!("║ Timing Breakdown:                                     ║");
        eprintln!(
            "║   - Cloning:          {:>8.2}s                     ║",
            self.materialize_duration.as_secs_f64()
        );
        eprintln!(
            "║   - Scanning:         {:>8.2}s                     ║",
            self.scan_duration.as_secs_f64()
        );
        eprintln!(
            "║   - Rendering:        {:>8.2}s                     ║",
            self.render_duration.as_secs_f64()
        );
        eprintln!(
            "║   - Total:            {:>8.2}s                     ║",
            self.duration.as_secs_f64()
        );
        eprintln!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Timings {
    total: Duration,
    materialize: Duration,
    scan: Duration,
    render: Duration,
}

/// The finished document and how it was produced.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Formatted document
    pub document: String,

    /// Run statistics
    pub stats: ExtractStats,
}

/// Main pipeline orchestrator: materialize, scan, render, write.
pub struct Pipeline {
    config: Config,
    materializer: Box<dyn Materializer>,
    exclusions: ExclusionSet,
    engine: TemplateEngine,
}

impl Pipeline {
    /// Creates a new pipeline that clones with the git CLI.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - Template engine initialization fails
    pub fn new(config: Config) -> Result<Self> {
        let materializer = Box::new(GitCli::new(config.git.clone()));
        Self::with_materializer(config, materializer)
    }

    /// Creates a new pipeline with a custom materializer.
    ///
    /// # Errors
    ///
    /// Same as [`Pipeline::new`].
    pub fn with_materializer(config: Config, materializer: Box<dyn Materializer>) -> Result<Self> {
        config.validate()?;

        let exclusions = ExclusionSet::new(&config.exclusions)?;
        let engine = TemplateEngine::new(config.format, config.template_path.as_deref())?;

        Ok(Self {
            config,
            materializer,
            exclusions,
            engine,
        })
    }

    /// Executes the complete pipeline.
    ///
    /// # Process
    ///
    /// 1. **Materialize**: clones a remote source into a temporary directory
    /// 2. **Scan**: walks the tree and reads file contents
    /// 3. **Render**: formats the document
    ///
    /// The document is also written to `output_file` when one is
    /// configured. A temporary clone is deleted before this returns, on
    /// success and on failure.
    ///
    /// # Errors
    ///
    /// Returns a materialization error if the repository cannot be cloned,
    /// and an error if rendering or writing fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use repo_extract::{Config, Pipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .repository("https://github.com/rust-lang/log.git")
    ///     .build()?;
    ///
    /// let extraction = Pipeline::new(config)?.run()?;
    /// print!("{}", extraction.document);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(source = ?self.config.source))]
    pub fn run(self) -> Result<Extraction> {
        let start_time = Instant::now();
        let mut timings = Timings::default();

        info!("Stage 1/3: Materializing repository...");
        let materialize_start = Instant::now();
        let checkout = self.materialize()?;
        timings.materialize = materialize_start.elapsed();

        info!("Stage 2/3: Scanning {}...", checkout.root().display());
        let scan_start = Instant::now();
        let snapshot = Scanner::new(&self.exclusions).scan(checkout.root())?;
        timings.scan = scan_start.elapsed();

        info!(
            "✓ Listed {} files in {} directories, {} with content, in {:.2}s",
            snapshot.stats.files,
            snapshot.stats.directories,
            snapshot.stats.text_files,
            timings.scan.as_secs_f64()
        );

        info!("Stage 3/3: Rendering document...");
        let render_start = Instant::now();
        let document = self.engine.render(&snapshot)?;
        timings.render = render_start.elapsed();

        // the clone is not needed past this point
        drop(checkout);

        if let Some(ref output) = self.config.output_file {
            Writer::new(output).write(&document)?;
        }

        timings.total = start_time.elapsed();
        let stats = ExtractStats::new(&snapshot.stats, document.len(), timings);

        info!(
            "✓ Extraction completed in {:.2}s",
            timings.total.as_secs_f64()
        );

        Ok(Extraction { document, stats })
    }

    fn materialize(&self) -> Result<Checkout> {
        match &self.config.source {
            Source::Remote(url) => self.materializer.materialize(url),
            Source::Local(root) => Ok(Checkout::borrowed(root)),
        }
    }
}
