use anyhow::Context;
use clap::Parser;
use repo_extract::{Config, ExclusionConfig, NamePattern, OutputFormat, Pipeline};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "repo-extract",
    version,
    author,
    about = "Flatten a git repository into one LLM-ready text document",
    long_about = "Clone a git repository and print its file tree followed by the contents of \
    every text file, ready to paste into an LLM prompt.\n\n\
    Hidden files, README*, requirements.txt* and prerequisites* files are left out by \
    default, as is the .git directory. Binary files are listed in the tree but their \
    contents are not included.\n\n\
    USAGE EXAMPLES:\n  \
      # Print a repository to stdout\n  \
      repo-extract https://github.com/username/repository.git\n\n  \
      # Copy it to the clipboard\n  \
      repo-extract https://github.com/username/repository.git | pbcopy\n\n  \
      # Format a local checkout as Markdown into a file\n  \
      repo-extract --dir ./my-project --format markdown -o context.md\n\n  \
      # Shallow clone of a branch, skipping lock files\n  \
      repo-extract https://github.com/username/repository.git --depth 1 --branch dev --exclude '*.lock'"
)]
struct Cli {
    /// Repository URL to clone (anything `git clone` accepts)
    #[arg(value_name = "URL", required_unless_present = "dir", conflicts_with = "dir")]
    url: Option<String>,

    /// Format an existing local directory instead of cloning
    #[arg(short, long, value_name = "PATH")]
    dir: Option<PathBuf>,

    /// Write the document to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    format: CliFormat,

    /// Path to a custom Tera template file
    ///
    /// The template replaces the built-in plain or markdown template. The
    /// context is available as `ctx` (ctx.tree, ctx.separator, ctx.files,
    /// ctx.stats).
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Additional exclusion pattern (can be used multiple times)
    ///
    /// Matched case-insensitively against each entry name. Accepts
    /// exact:NAME, prefix:TEXT, contains:TEXT, glob:PATTERN, or a bare glob.
    ///
    /// Example: --exclude '*.lock' --exclude contains:secret
    #[arg(short = 'x', long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Directory name to skip entirely, subtree included (can be used multiple times)
    #[arg(long, value_name = "NAME")]
    prune_dir: Vec<String>,

    /// Apply exclusion patterns to directory names as well
    #[arg(long)]
    match_dirs: bool,

    /// Keep hidden files such as .env or .gitignore
    #[arg(long)]
    include_hidden: bool,

    /// Start from an empty exclusion list instead of the defaults
    #[arg(long)]
    no_default_excludes: bool,

    /// Make a shallow clone with this many commits
    #[arg(long, value_name = "N")]
    depth: Option<u32>,

    /// Branch or tag to clone
    #[arg(short, long, value_name = "NAME")]
    branch: Option<String>,

    /// git executable to use
    #[arg(long, env = "REPO_EXTRACT_GIT", default_value = "git", value_name = "PATH")]
    git: String,

    /// Print a summary of the extraction to stderr
    #[arg(long)]
    stats: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliFormat {
    Plain,
    Markdown,
    Json,
}

impl From<CliFormat> for OutputFormat {
    fn from(f: CliFormat) -> Self {
        match f {
            CliFormat::Plain => Self::Plain,
            CliFormat::Markdown => Self::Markdown,
            CliFormat::Json => Self::Json,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    let exclusions = build_exclusions(&cli)?;

    let mut builder = Config::builder()
        .format(cli.format.into())
        .exclusions(exclusions)
        .git_program(cli.git);

    builder = match (cli.url, cli.dir) {
        (Some(url), _) => builder.repository(url),
        (None, Some(dir)) => builder.root_dir(dir),
        (None, None) => anyhow::bail!("Either a repository URL or --dir must be given"),
    };

    if let Some(output) = cli.output.clone() {
        builder = builder.output_file(output);
    }

    if let Some(template) = cli.template {
        builder = builder.template_path(template);
    }

    if let Some(depth) = cli.depth {
        builder = builder.depth(depth);
    }

    if let Some(branch) = cli.branch {
        builder = builder.branch(branch);
    }

    let config = builder.build().context("Failed to build configuration")?;

    let extraction = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run()
        .context("Extraction failed")?;

    if cli.output.is_none() {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(extraction.document.as_bytes())
            .and_then(|()| stdout.flush())
            .context("Failed to write document to stdout")?;
    }

    if cli.stats {
        extraction.stats.print_summary();
    }

    Ok(())
}

fn build_exclusions(cli: &Cli) -> anyhow::Result<ExclusionConfig> {
    let mut exclusions = if cli.no_default_excludes {
        ExclusionConfig::empty()
    } else {
        ExclusionConfig::default()
    };

    if cli.include_hidden {
        exclusions = exclusions.include_hidden();
    }

    for raw in &cli.exclude {
        let pattern: NamePattern = raw
            .parse()
            .with_context(|| format!("Invalid exclusion pattern '{raw}'"))?;
        exclusions = exclusions.exclude(pattern);
    }

    for name in &cli.prune_dir {
        exclusions = exclusions.prune_dir(name.as_str());
    }

    Ok(exclusions.match_directories(cli.match_dirs))
}

fn setup_tracing(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "repo_extract=warn",
        1 => "repo_extract=info",
        2 => "repo_extract=debug",
        _ => "repo_extract=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // stdout carries the document
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
