use serde::Serialize;
use std::path::PathBuf;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE_INDENT: &str = "│   ";
const SPACE_INDENT: &str = "    ";

/// One entry visited by the walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    /// Absolute path on disk
    #[serde(skip)]
    pub path: PathBuf,

    /// Path relative to the root, `/`-separated
    pub relative_path: String,

    /// Final path component
    pub name: String,

    /// Whether the entry is a directory
    pub is_dir: bool,

    /// Whether the entry is a symbolic link; links are listed, never read
    pub is_symlink: bool,

    /// Nesting depth, 1 for direct children of the root
    pub depth: usize,
}

/// Renders nodes in depth-first order into branch-marker lines.
///
/// Nodes must be in pre-order with depths starting at 1, as produced by the
/// scanner. Every line ends with `\n`; an empty slice renders to an empty
/// string.
#[must_use]
pub fn render_tree(nodes: &[TreeNode]) -> String {
    render_lines(nodes).into_iter().fold(String::new(), |mut out, line| {
        out.push_str(&line);
        out.push('\n');
        out
    })
}

/// Renders nodes into one string per line, without trailing newlines.
#[must_use]
pub fn render_lines(nodes: &[TreeNode]) -> Vec<String> {
    let last = last_sibling_flags(nodes);
    let mut ancestors_last: Vec<bool> = Vec::new();
    let mut lines = Vec::with_capacity(nodes.len());

    for (node, is_last) in nodes.iter().zip(last) {
        let level = node.depth.saturating_sub(1);
        ancestors_last.truncate(level);

        let mut line = String::with_capacity(level * 4 + node.name.len() + 4);
        for &ancestor_last in &ancestors_last {
            line.push_str(if ancestor_last { SPACE_INDENT } else { PIPE_INDENT });
        }
        line.push_str(if is_last { LAST_BRANCH } else { BRANCH });
        line.push_str(&node.name);
        lines.push(line);

        ancestors_last.push(is_last);
    }

    lines
}

/// Marks each node that has no later sibling under the same parent.
fn last_sibling_flags(nodes: &[TreeNode]) -> Vec<bool> {
    let mut flags = vec![false; nodes.len()];
    // sibling_follows[d]: a node at depth d was seen after the current
    // position without a shallower node in between
    let mut sibling_follows: Vec<bool> = Vec::new();

    for (i, node) in nodes.iter().enumerate().rev() {
        let depth = node.depth;
        if sibling_follows.len() <= depth {
            sibling_follows.resize(depth + 1, false);
        }

        flags[i] = !sibling_follows[depth];
        sibling_follows[depth] = true;
        sibling_follows.truncate(depth + 1);
    }

    flags
}
