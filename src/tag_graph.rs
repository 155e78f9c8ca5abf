//! Graph of which tags appear as children of which other tags
//!
//! Nodes are distinct tag names, edges are observed parent-tag → child-tag
//! relationships anywhere in a subtree. Traversals include the root itself.
//! Drawing is left to Graphviz: [`write_graph`] emits DOT and, for image
//! formats, pipes it through the `dot` executable.

use crate::element::Element;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Unique tags at and under `root`, in first-encounter pre-order.
///
/// Each call starts a fresh traversal.
pub fn list_tags<'a, E: Element<'a>>(root: E) -> impl Iterator<Item = &'a str> + 'a {
    let mut seen = HashSet::new();
    root.descendants()
        .map(|node| node.tag())
        .filter(move |tag| seen.insert(*tag))
}

/// Distinct tags of the direct children of every `tag` element at or under
/// `root`, in first-seen order.
pub fn unique_child_tags<'a, E: Element<'a>>(
    root: E,
    tag: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    let mut seen = HashSet::new();
    root.descendants()
        .filter(move |node| node.tag() == tag)
        .flat_map(|node| node.children().map(|child| child.tag()))
        .filter(move |child_tag| seen.insert(*child_tag))
}

/// Directed tag graph; see [`build_tag_graph`]
#[derive(Debug, Clone, Default)]
pub struct TagGraph {
    graph: DiGraph<String, ()>,
    index: IndexMap<String, NodeIndex>,
}

impl TagGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag node, returning the existing one if already present
    pub fn add_tag(&mut self, tag: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(tag) {
            return idx;
        }
        let idx = self.graph.add_node(tag.to_string());
        self.index.insert(tag.to_string(), idx);
        idx
    }

    /// Adds `parent → child`, creating either node as needed. Repeated edges are ignored.
    pub fn add_edge(&mut self, parent: &str, child: &str) {
        let p = self.add_tag(parent);
        let c = self.add_tag(child);
        self.graph.update_edge(p, c, ());
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .raw_edges()
            .iter()
            .map(|e| (self.graph[e.source()].as_str(), self.graph[e.target()].as_str()))
            .collect()
    }

    pub fn contains_edge(&self, parent: &str, child: &str) -> bool {
        match (self.index.get(parent), self.index.get(child)) {
            (Some(&p), Some(&c)) => self.graph.contains_edge(p, c),
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Graphviz DOT source for this graph, nodes labelled by tag
    pub fn to_dot(&self) -> String {
        let labelled = self.graph.map(|_, tag| tag.as_str(), |_, _| "");
        format!("{}", Dot::with_config(&labelled, &[Config::EdgeNoLabel]))
    }
}

pub fn build_tag_graph<'a, E: Element<'a>>(root: E) -> TagGraph {
    let mut graph = TagGraph::new();
    let tags: Vec<&'a str> = list_tags(root).collect();
    for &tag in &tags {
        graph.add_tag(tag);
    }
    for &parent in &tags {
        for child in unique_child_tags(root, parent) {
            graph.add_edge(parent, child);
        }
    }
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built tag graph"
    );
    graph
}

/// Writes `graph` to `filename` in the given format.
///
/// `dot` and `gv` write the DOT source as-is; anything else (`png`, `svg`,
/// `pdf`, ...) is rendered by the Graphviz `dot` executable, which must be on
/// `PATH`.
pub fn write_graph<P: AsRef<Path>>(graph: &TagGraph, filename: P, format: &str) -> Result<()> {
    let filename = filename.as_ref();
    let dot = graph.to_dot();
    debug!(file = %filename.display(), format, "writing tag graph");

    if matches!(format, "dot" | "gv") {
        fs::write(filename, dot)
            .with_context(|| format!("Failed to write {}", filename.display()))?;
        return Ok(());
    }

    let mut child = Command::new("dot")
        .arg(format!("-T{}", format))
        .arg("-o")
        .arg(filename)
        .stdin(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to run Graphviz 'dot'; is it installed and on PATH?")?;

    child
        .stdin
        .take()
        .context("Graphviz stdin unavailable")?
        .write_all(dot.as_bytes())
        .context("Failed to send graph to Graphviz")?;

    let output = child.wait_with_output().context("Graphviz did not finish")?;
    anyhow::ensure!(
        output.status.success(),
        "Graphviz failed rendering {} as {}: {}",
        filename.display(),
        format,
        String::from_utf8_lossy(&output.stderr).trim()
    );
    Ok(())
}

pub fn write_tag_graph<'a, E: Element<'a>, P: AsRef<Path>>(root: E, filename: P, format: &str) -> Result<()> {
    write_graph(&build_tag_graph(root), filename, format)
}
