//! Basic example of using repo-extract as a library
//!
//! Formats a local directory, then runs the full pipeline with a custom
//! materializer in place of `git clone`.

use repo_extract::{
    format_dir, Checkout, Config, ExclusionConfig, ExclusionSet, Materializer, OutputFormat,
    Pipeline,
};
use std::path::{Path, PathBuf};

/// Serves an existing checkout instead of cloning.
struct LocalMirror {
    root: PathBuf,
}

impl Materializer for LocalMirror {
    fn materialize(&self, url: &str) -> repo_extract::Result<Checkout> {
        println!("Resolving {url} to {}", self.root.display());
        Ok(Checkout::borrowed(&self.root))
    }
}

fn main() -> anyhow::Result<()> {
    // Plain document for a local directory with the default exclusions
    let exclusions = ExclusionSet::new(&ExclusionConfig::default())?;
    let document = format_dir(Path::new("./src"), &exclusions)?;
    println!("{document}");

    // Full pipeline, Markdown output, repository served from disk
    let config = Config::builder()
        .repository("https://github.com/username/repository.git")
        .format(OutputFormat::Markdown)
        .build()?;
    let mirror = LocalMirror {
        root: PathBuf::from("."),
    };

    let extraction = Pipeline::with_materializer(config, Box::new(mirror))?.run()?;
    extraction.stats.print_summary();

    println!(
        "\n✓ Extracted {} of {} files ({} bytes)",
        extraction.stats.text_files, extraction.stats.files, extraction.stats.document_bytes
    );

    Ok(())
}
