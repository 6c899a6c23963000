use crate::{
    config::OutputFormat,
    error::{Error, Result},
    file::FileData,
    scanner::{ScanStats, Snapshot},
    tree::render_lines,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tera::{Context, Tera, Value};

/// Line between the tree section and the content section.
pub(crate) const SECTION_SEPARATOR: &str = "----------------------------------------";

const CUSTOM_TEMPLATE: &str = "custom";

#[derive(Serialize)]
struct TemplateContext<'a> {
    tree: &'a str,
    separator: &'static str,
    files: Vec<FileView<'a>>,
    stats: &'a ScanStats,
}

#[derive(Serialize)]
struct FileView<'a> {
    path: &'a str,
    content: &'a str,
    /// Content without its final newline, for templates that add their own
    body: &'a str,
    language: &'static str,
    fence: String,
    lines: usize,
}

impl<'a> FileView<'a> {
    fn new(file: &'a FileData) -> Self {
        let content = file.content.as_str();
        Self {
            path: &file.relative_path,
            content,
            body: content.strip_suffix('\n').unwrap_or(content),
            language: detect_language(&file.relative_path),
            fence: fence_for(content),
            lines: file.line_count(),
        }
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    tree: Vec<String>,
    files: &'a [FileData],
    stats: &'a ScanStats,
}

/// Renders snapshots into the final document.
pub(crate) struct TemplateEngine {
    tera: Tera,
    format: OutputFormat,
    custom: bool,
}

impl TemplateEngine {
    /// Creates a template engine for the format, optionally overridden by
    /// an external template file.
    ///
    /// # Errors
    ///
    /// Returns an error if template registration fails.
    pub(crate) fn new(format: OutputFormat, template_path: Option<&Path>) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        Self::register_builtin_templates(&mut tera)?;
        Self::register_filters(&mut tera);

        if let Some(path) = template_path {
            tera.add_template_file(path, Some(CUSTOM_TEMPLATE))
                .map_err(|e| Error::template(path.display().to_string(), e))?;
        }

        Ok(Self {
            tera,
            format,
            custom: template_path.is_some(),
        })
    }

    /// Checks that an external template file parses.
    ///
    /// # Errors
    ///
    /// Returns a template error describing the syntax problem.
    pub(crate) fn check_template_file(path: &Path) -> Result<()> {
        let mut tera = Tera::default();
        Self::register_filters(&mut tera);
        tera.add_template_file(path, Some(CUSTOM_TEMPLATE))
            .map_err(|e| Error::template(path.display().to_string(), e))
    }

    /// Registers built-in templates for each text format.
    fn register_builtin_templates(tera: &mut Tera) -> Result<()> {
        tera.add_raw_template("plain", include_str!("../templates/plain.tera"))
            .map_err(|e| Error::template("plain", e))?;

        tera.add_raw_template("markdown", include_str!("../templates/markdown.tera"))
            .map_err(|e| Error::template("markdown", e))?;

        Ok(())
    }

    /// Registers custom Tera filters.
    fn register_filters(tera: &mut Tera) {
        tera.register_filter("xml_escape", Self::xml_escape_filter);
        tera.register_filter("detect_language", Self::detect_language_filter);
    }

    fn xml_escape_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        if let Some(s) = value.as_str() {
            let escaped = s
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;")
                .replace('"', "&quot;")
                .replace('\'', "&apos;");
            Ok(Value::String(escaped))
        } else {
            Ok(value.clone())
        }
    }

    fn detect_language_filter(
        value: &Value,
        _args: &HashMap<String, Value>,
    ) -> tera::Result<Value> {
        let language = value.as_str().map_or("", detect_language);
        Ok(Value::String(language.to_string()))
    }

    /// Renders a snapshot in the configured format.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering or serialization fails.
    pub(crate) fn render(&self, snapshot: &Snapshot) -> Result<String> {
        if self.format == OutputFormat::Json && !self.custom {
            return Self::render_json(snapshot);
        }

        let template_name = if self.custom {
            CUSTOM_TEMPLATE
        } else {
            self.format.template_name()
        };

        let context = TemplateContext {
            tree: &snapshot.tree,
            separator: SECTION_SEPARATOR,
            files: snapshot.files.iter().map(FileView::new).collect(),
            stats: &snapshot.stats,
        };

        let mut tera_context = Context::new();
        tera_context.insert("ctx", &context);

        self.tera
            .render(template_name, &tera_context)
            .map_err(|e| Error::template(template_name, e))
    }

    fn render_json(snapshot: &Snapshot) -> Result<String> {
        let document = JsonDocument {
            tree: render_lines(&snapshot.nodes),
            files: &snapshot.files,
            stats: &snapshot.stats,
        };

        let mut json = serde_json::to_string_pretty(&document)?;
        json.push('\n');
        Ok(json)
    }
}

/// Backtick fence one longer than the longest run inside `content`.
fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut current = 0;
    for c in content.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

/// Maps a file name to a Markdown code-fence language.
fn detect_language(path: &str) -> &'static str {
    let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    match name.as_str() {
        "dockerfile" => return "dockerfile",
        "makefile" => return "makefile",
        _ => {}
    }

    let Some((_, ext)) = name.rsplit_once('.') else {
        return "";
    };

    match ext {
        "rs" => "rust",
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" => "typescript",
        "jsx" => "jsx",
        "tsx" => "tsx",
        "go" => "go",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "kt" => "kotlin",
        "scala" => "scala",
        "sh" | "bash" => "bash",
        "zsh" => "zsh",
        "ps1" => "powershell",
        "html" | "htm" => "html",
        "css" => "css",
        "scss" => "scss",
        "xml" => "xml",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "ini" => "ini",
        "md" | "markdown" => "markdown",
        "sql" => "sql",
        "graphql" | "gql" => "graphql",
        "proto" => "protobuf",
        _ => "",
    }
}
