//! Integration tests for extraction output, exclusions and determinism.

use assert_fs::prelude::*;
use assert_fs::TempDir;
use repo_extract::{
    format_dir, scan_dir, Checkout, Config, Error, ExclusionConfig, ExclusionSet, GitCli,
    GitOptions, Materializer, NameFilter, OutputFormat, Pipeline, Source,
};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::rc::Rc;

const SEPARATOR: &str = "----------------------------------------";

fn default_set() -> ExclusionSet {
    ExclusionSet::new(&ExclusionConfig::default()).expect("default exclusions compile")
}

/// Splits a plain document into its tree lines and content section.
fn split_document(document: &str) -> (Vec<&str>, &str) {
    let body = document.strip_prefix("File Tree:\n").expect("header line");
    let (tree, content) = body
        .split_once(&format!("\n{SEPARATOR}\n"))
        .expect("section separator");
    (tree.lines().collect(), content)
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        dir.child("README.md").write_str("# Project").unwrap();
        dir.child(".env").write_str("API_KEY=hunter2").unwrap();
        dir.child(".git/config").write_str("[core]").unwrap();
        dir.child("requirements.txt").write_str("flask").unwrap();
        dir.child("src/app.py").write_str("import flask\n").unwrap();
        dir.child("src/utils/helpers.py").write_str("def helper():\n    pass\n").unwrap();
        dir.child("src/Zeta.py").write_str("Z = 1\n").unwrap();
        dir.child("assets/logo.png")
            .write_binary(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0])
            .unwrap();
        dir.child("main.py").write_str("print('hello')\n").unwrap();
        dir.child("docs").create_dir_all().unwrap();
        Self { dir }
    }

    fn document(&self) -> String {
        format_dir(self.dir.path(), &default_set()).expect("format fixture")
    }
}

#[test]
fn scenario_excluded_names_are_dropped_everywhere() {
    let temp = TempDir::new().unwrap();
    temp.child("README.md").write_str("# readme").unwrap();
    temp.child(".env").write_str("SECRET=1").unwrap();
    temp.child("main.py").write_str("print('hi')").unwrap();

    let document = format_dir(temp.path(), &default_set()).unwrap();
    let (tree, content) = split_document(&document);

    assert_eq!(tree, vec!["└── main.py"]);
    assert_eq!(content, "<main.py>\nprint('hi')\n</main.py>\n");
}

#[test]
fn scenario_empty_root_is_not_an_error() {
    let temp = TempDir::new().unwrap();

    let document = format_dir(temp.path(), &default_set()).unwrap();

    assert_eq!(document, format!("File Tree:\n\n{SEPARATOR}\n"));
}

#[test]
fn scenario_binary_file_listed_without_content() {
    let temp = TempDir::new().unwrap();
    temp.child("image.png")
        .write_binary(&[0x89, b'P', b'N', b'G', 0, 0, 0, 0x0d])
        .unwrap();
    temp.child("app.js").write_str("console.log('app');").unwrap();

    let document = format_dir(temp.path(), &default_set()).unwrap();
    let (tree, content) = split_document(&document);

    assert_eq!(tree, vec!["├── app.js", "└── image.png"]);
    assert!(content.contains("<app.js>\nconsole.log('app');\n</app.js>"));
    assert!(!content.contains("image.png"));
}

#[test]
fn scenario_invalid_url_fails_before_processing() {
    struct Unreachable;

    impl Materializer for Unreachable {
        fn materialize(&self, url: &str) -> repo_extract::Result<Checkout> {
            repo_extract::validate_url(url)?;
            panic!("materializer must not get past URL validation");
        }
    }

    let config = Config::builder()
        .repository("this is not a repository")
        .build()
        .unwrap();

    let err = Pipeline::with_materializer(config, Box::new(Unreachable))
        .unwrap()
        .run()
        .unwrap_err();

    assert!(err.is_materialization());
    assert!(matches!(err, Error::InvalidUrl { .. }));
}

#[test]
fn invalid_url_through_git_cli() {
    let config = Config::builder()
        .repository("ftp://example.com/repo.git")
        .build()
        .unwrap();

    let err = Pipeline::new(config).unwrap().run().unwrap_err();

    assert!(err.is_materialization());
}

#[test]
fn unreachable_repository_is_materialization_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("no-such-repo");
    std::fs::create_dir(&missing).unwrap();

    let cli = GitCli::new(GitOptions::default());
    let err = cli.materialize(missing.to_str().unwrap()).unwrap_err();

    assert!(err.is_materialization());
}

fn git(dir: &Path, args: &[&str]) -> std::io::Result<Output> {
    Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .output()
}

/// Commits a small project into `dir`. Returns false when git is not installed.
fn commit_project(dir: &TempDir) -> bool {
    dir.child("README.md").write_str("# Project").unwrap();
    dir.child("src/main.rs").write_str("fn main() {}").unwrap();

    let Ok(init) = git(dir.path(), &["init", "--quiet"]) else {
        return false;
    };
    assert!(init.status.success());
    for args in [&["add", "-A"][..], &["commit", "--quiet", "-m", "initial"][..]] {
        let out = git(dir.path(), args).unwrap();
        assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    }
    true
}

fn file_url(dir: &Path) -> String {
    url::Url::from_directory_path(dir).unwrap().to_string()
}

fn expected_project_document() -> String {
    format!(
        "File Tree:\n└── src\n    └── main.rs\n\n{SEPARATOR}\n\
         <src/main.rs>\nfn main() {{}}\n</src/main.rs>\n"
    )
}

/// Delegates to git and remembers where each checkout was placed.
struct Recording {
    inner: GitCli,
    roots: Rc<RefCell<Vec<PathBuf>>>,
}

impl Materializer for Recording {
    fn materialize(&self, url: &str) -> repo_extract::Result<Checkout> {
        let checkout = self.inner.materialize(url)?;
        self.roots.borrow_mut().push(checkout.root().to_path_buf());
        Ok(checkout)
    }
}

#[test]
fn remote_repository_is_cloned_and_formatted() {
    let source = TempDir::new().unwrap();
    if !commit_project(&source) {
        return;
    }

    let config = Config::builder()
        .source(Source::Remote(file_url(source.path())))
        .build()
        .unwrap();
    let extraction = Pipeline::new(config).unwrap().run().unwrap();

    assert_eq!(extraction.document, expected_project_document());
    assert_eq!(extraction.stats.files, 1);
}

#[test]
fn clone_is_deleted_after_extraction() {
    let source = TempDir::new().unwrap();
    if !commit_project(&source) {
        return;
    }
    let roots = Rc::new(RefCell::new(Vec::new()));
    let materializer = Recording {
        inner: GitCli::new(GitOptions::default()),
        roots: Rc::clone(&roots),
    };

    let config = Config::builder()
        .source(Source::Remote(file_url(source.path())))
        .build()
        .unwrap();
    let extraction = Pipeline::with_materializer(config, Box::new(materializer))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(extraction.document, expected_project_document());
    let roots = roots.borrow();
    assert_eq!(roots.len(), 1);
    let workspace = roots[0].parent().unwrap();
    assert!(workspace
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("repo-extract-"));
    assert!(!workspace.exists(), "{} left behind", workspace.display());
}

#[test]
fn every_listed_file_appears_once() {
    let fixture = Fixture::new();
    let document = fixture.document();
    let (tree, content) = split_document(&document);

    for name in ["app.py", "helpers.py", "Zeta.py", "logo.png", "main.py"] {
        let count = tree.iter().filter(|line| line.ends_with(&format!(" {name}"))).count();
        assert_eq!(count, 1, "{name} should be listed once");
    }

    for path in ["src/app.py", "src/utils/helpers.py", "src/Zeta.py", "main.py"] {
        assert_eq!(content.matches(&format!("<{path}>\n")).count(), 1, "{path}");
    }
    assert!(!content.contains("<assets/logo.png>"));
}

#[test]
fn excluded_names_never_appear() {
    let fixture = Fixture::new();
    let document = fixture.document();
    let (tree, content) = split_document(&document);

    for excluded in ["README.md", ".env", ".git", "config", "requirements.txt"] {
        assert!(
            !tree.iter().any(|line| line.ends_with(&format!(" {excluded}"))),
            "{excluded} in tree"
        );
    }
    assert!(!content.contains("hunter2"));
    assert!(!content.contains("[core]"));
    assert!(!content.contains("flask\n<"));
}

#[test]
fn full_tree_layout() {
    let fixture = Fixture::new();
    let document = fixture.document();
    let (tree, _) = split_document(&document);

    assert_eq!(
        tree,
        vec![
            "├── assets",
            "│   └── logo.png",
            "├── docs",
            "├── main.py",
            "└── src",
            "    ├── Zeta.py",
            "    ├── app.py",
            "    └── utils",
            "        └── helpers.py",
        ]
    );
}

#[test]
fn formatting_is_idempotent() {
    let fixture = Fixture::new();

    let first = fixture.document();
    let second = fixture.document();

    assert_eq!(first, second);
}

#[test]
fn sibling_order_is_sorted_regardless_of_creation_order() {
    let forward = TempDir::new().unwrap();
    let backward = TempDir::new().unwrap();
    let names = ["delta.rs", "alpha.rs", "charlie.rs", "bravo.rs"];

    for name in names {
        forward.child(name).write_str(name).unwrap();
    }
    for name in names.iter().rev() {
        backward.child(name).write_str(name).unwrap();
    }

    let a = format_dir(forward.path(), &default_set()).unwrap();
    let b = format_dir(backward.path(), &default_set()).unwrap();

    assert_eq!(a, b);
    let (tree, _) = split_document(&a);
    assert_eq!(
        tree,
        vec!["├── alpha.rs", "├── bravo.rs", "├── charlie.rs", "└── delta.rs"]
    );
}

#[test]
fn unreadable_file_is_soft_failure() {
    let temp = TempDir::new().unwrap();
    temp.child("latin1.txt").write_binary(&[b'c', b'a', b'f', 0xe9]).unwrap();
    temp.child("ok.txt").write_str("fine").unwrap();

    let snapshot = scan_dir(temp.path(), &default_set()).unwrap();

    assert_eq!(snapshot.stats.files, 2);
    assert_eq!(snapshot.stats.unreadable_files, 1);
    assert_eq!(snapshot.files.len(), 1);
    assert_eq!(snapshot.files[0].relative_path, "ok.txt");
}

#[cfg(unix)]
#[test]
fn symlinked_content_outside_root_is_not_extracted() {
    let outside = TempDir::new().unwrap();
    outside.child("secret").write_str("TOP-SECRET-KEY").unwrap();
    let repo = TempDir::new().unwrap();
    repo.child("main.py").write_str("print('hi')\n").unwrap();
    std::os::unix::fs::symlink(outside.child("secret").path(), repo.child("link.txt").path())
        .unwrap();

    let document = format_dir(repo.path(), &ExclusionSet::default()).unwrap();
    let (tree, content) = split_document(&document);

    assert_eq!(tree, vec!["├── link.txt", "└── main.py"]);
    assert!(!document.contains("TOP-SECRET-KEY"));
    assert!(!content.contains("<link.txt>"));
}

#[test]
fn injected_predicate_controls_exclusion() {
    let temp = TempDir::new().unwrap();
    temp.child("keep.rs").write_str("keep").unwrap();
    temp.child("generated/out.rs").write_str("gen").unwrap();
    let seen = Rc::new(Cell::new(0));
    let seen_in_filter = Rc::clone(&seen);

    let filter = move |name: &str, is_dir: bool| {
        seen_in_filter.set(seen_in_filter.get() + 1);
        is_dir && name == "generated"
    };
    let document = format_dir(temp.path(), &filter).unwrap();

    assert!(seen.get() >= 2);
    assert!(!document.contains("generated"));
    assert!(document.contains("<keep.rs>\nkeep\n</keep.rs>"));
}

#[test]
fn match_directories_prunes_matching_directories() {
    let temp = TempDir::new().unwrap();
    temp.child(".github/workflows/ci.yml").write_str("on: push").unwrap();
    temp.child("lib.rs").write_str("").unwrap();

    let default_doc = format_dir(temp.path(), &default_set()).unwrap();
    assert!(default_doc.contains("<.github/workflows/ci.yml>"));

    let strict = ExclusionSet::new(&ExclusionConfig::default().match_directories(true)).unwrap();
    let strict_doc = format_dir(temp.path(), &strict).unwrap();
    assert!(!strict_doc.contains(".github"));
    assert!(!strict_doc.contains("ci.yml"));
}

#[test]
fn closure_satisfies_name_filter() {
    fn assert_filter(filter: &dyn NameFilter) -> bool {
        filter.is_excluded("x.tmp", false)
    }

    assert!(assert_filter(&|name: &str, _: bool| name.ends_with(".tmp")));
}

#[test]
fn markdown_and_json_are_deterministic() {
    let fixture = Fixture::new();

    for format in [OutputFormat::Markdown, OutputFormat::Json] {
        let render = || {
            let config = Config::builder()
                .root_dir(fixture.dir.path())
                .format(format)
                .build()
                .unwrap();
            Pipeline::new(config).unwrap().run().unwrap().document
        };
        assert_eq!(render(), render(), "{format:?}");
    }
}
