// SPDX-License-Identifier: MIT

//! Recursive dag renderer
//!
//! Walks a dag depth-first, one call per (nested) dag, and appends DOT
//! vertex, cluster and edge statements to a buffer. Each call returns the
//! key of the dag's last rendered vertex so the caller can wire whatever
//! follows it.
//!
//! Node shapes:
//! - operation chain: one vertex per operation inside a node cluster
//! - sub-dag: a node cluster around the recursively rendered nested dag
//! - conditional: decision vertex, one labelled cluster per branch, join vertex
//! - foreach: entry vertex, the nested dag, join vertex

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::dag::model::{Dag, Node, NodeKind, Operation, ROOT_DAG_ID};
use crate::viz::key::{vertex_key, VertexTag};
use crate::viz::style::{ClusterStyle, RenderStyle, VertexStyle};

/// Key of the first vertex execution reaches when entering `node`
///
/// Static sub-dags are unwrapped through their start nodes; a dynamic node
/// resolves to its decision/entry vertex, an operation node to its first
/// operation.
pub fn entry_key(dag: &Dag, node: &Node) -> Option<String> {
    let (dag, node) = dag.entry(node);
    match node.kind() {
        NodeKind::Conditional(_) => Some(vertex_key(
            dag.id(),
            node.index(),
            0,
            VertexTag::Conditions,
        )),
        NodeKind::Foreach(_) => Some(vertex_key(dag.id(), node.index(), 0, VertexTag::Foreach)),
        NodeKind::Operations(ops) => ops
            .first()
            .map(|op| vertex_key(dag.id(), node.index(), 1, VertexTag::Operation(op))),
        // entry() never stops on a static sub-dag
        NodeKind::SubDag(_) => None,
    }
}

/// Append-only DOT body writer for one render
pub struct GraphRenderer<'s> {
    style: &'s RenderStyle,
    buf: String,
    clusters: usize,
}

impl<'s> GraphRenderer<'s> {
    pub fn new(style: &'s RenderStyle) -> Self {
        Self {
            style,
            buf: String::new(),
            clusters: 0,
        }
    }

    /// Text rendered so far
    pub fn output(&self) -> &str {
        &self.buf
    }

    pub fn into_output(self) -> String {
        self.buf
    }

    /// Render every node of `dag` at the given indent depth
    ///
    /// Returns the contribution of the last node (in index order) that
    /// declares no children. That is the vertex the enclosing construct
    /// connects to its join vertex.
    pub fn render_dag(&mut self, dag: &Dag, depth: usize) -> Option<String> {
        let mut last = None;

        for node in dag.nodes() {
            let contribution = match node.kind() {
                NodeKind::Conditional(branches) => {
                    Some(self.render_conditional(dag, node, branches, depth))
                }
                NodeKind::Foreach(sub) => Some(self.render_foreach(dag, node, sub, depth)),
                NodeKind::SubDag(sub) => {
                    self.open_cluster(depth, &node_cluster_label(dag, node), ClusterKind::Node);
                    let inner = self.render_dag(sub, depth + 1);
                    self.close_cluster(depth);
                    inner
                }
                NodeKind::Operations(ops) => {
                    self.open_cluster(depth, &node_cluster_label(dag, node), ClusterKind::Node);
                    let chain = self.render_operations(dag, node, ops, depth + 1);
                    self.close_cluster(depth);
                    chain
                }
            };

            if node.has_children() {
                if let Some(from) = &contribution {
                    for child in dag.children(node) {
                        if let Some(to) = entry_key(dag, child) {
                            self.edge(depth, from, &to, None);
                        }
                    }
                }
            } else {
                last = contribution;
            }

            self.buf.push('\n');
        }

        last
    }

    fn render_operations(
        &mut self,
        dag: &Dag,
        node: &Node,
        ops: &[Operation],
        depth: usize,
    ) -> Option<String> {
        let style = self.style;
        let mut previous: Option<String> = None;
        for (i, op) in ops.iter().enumerate() {
            let key = vertex_key(dag.id(), node.index(), i + 1, VertexTag::Operation(op));
            self.vertex(depth, &key, &style.operation);
            if let Some(prev) = &previous {
                self.edge(depth, prev, &key, None);
            }
            previous = Some(key);
        }
        previous
    }

    fn render_conditional(
        &mut self,
        dag: &Dag,
        node: &Node,
        branches: &BTreeMap<String, Dag>,
        depth: usize,
    ) -> String {
        let style = self.style;
        let condition_key = vertex_key(dag.id(), node.index(), 0, VertexTag::Conditions);
        self.vertex(depth, &condition_key, &style.condition);

        let end_key = vertex_key(dag.id(), node.index(), 0, VertexTag::End);
        self.vertex(depth, &end_key, &style.dynamic_end);

        for (label, branch) in branches {
            if let Some(first) = entry_key(branch, branch.start_node()) {
                self.edge(depth, &condition_key, &first, Some(label));
            }

            self.open_cluster(
                depth,
                &branch_cluster_label(dag, node, label),
                ClusterKind::Condition,
            );
            let branch_last = self.render_dag(branch, depth + 1);
            self.close_cluster(depth);

            if let Some(branch_last) = branch_last {
                self.edge(depth, &branch_last, &end_key, None);
            }
        }

        end_key
    }

    fn render_foreach(&mut self, dag: &Dag, node: &Node, sub: &Dag, depth: usize) -> String {
        let style = self.style;
        let foreach_key = vertex_key(dag.id(), node.index(), 0, VertexTag::Foreach);
        self.vertex(depth, &foreach_key, &style.foreach);

        let end_key = vertex_key(dag.id(), node.index(), 0, VertexTag::End);
        self.vertex(depth, &end_key, &style.dynamic_end);

        if let Some(first) = entry_key(sub, sub.start_node()) {
            self.edge(depth, &foreach_key, &first, None);
        }

        if let Some(sub_last) = self.render_dag(sub, depth + 1) {
            self.edge(depth, &sub_last, &end_key, None);
        }

        end_key
    }

    fn vertex(&mut self, depth: usize, key: &str, style: &VertexStyle) {
        let _ = write!(
            self.buf,
            "\n{}\"{}\" [shape={} style={} color={}];",
            indent(depth),
            escape(key),
            attr(&style.shape),
            attr(&style.style),
            attr(&style.color)
        );
    }

    fn edge(&mut self, depth: usize, from: &str, to: &str, label: Option<&str>) {
        let label = label
            .map(|l| format!("label=\"{}\" ", escape(l)))
            .unwrap_or_default();
        let _ = write!(
            self.buf,
            "\n{}\"{}\" -> \"{}\" [{}color={}];",
            indent(depth),
            escape(from),
            escape(to),
            label,
            attr(&self.style.edge_color)
        );
    }

    fn open_cluster(&mut self, depth: usize, label: &str, kind: ClusterKind) {
        let palette = self.style;
        let style: &ClusterStyle = match kind {
            ClusterKind::Node => &palette.node_cluster,
            ClusterKind::Condition => &palette.condition_cluster,
        };
        let outer = indent(depth);
        let inner = indent(depth + 1);
        let _ = write!(
            self.buf,
            "\n{outer}subgraph cluster_{} {{\n{inner}label=\"{}\";\n{inner}color={};\n{inner}style={};\n",
            self.clusters,
            escape(label),
            attr(&style.color),
            attr(&style.style),
        );
        self.clusters += 1;
    }

    fn close_cluster(&mut self, depth: usize) {
        let _ = write!(self.buf, "\n{}}}", indent(depth));
    }
}

#[derive(Clone, Copy)]
enum ClusterKind {
    Node,
    Condition,
}

/// Label of the cluster around a static node
///
/// Exporters that auto-name nodes use the zero-based position as id; such
/// ids add nothing, so only the index is shown for them.
/// Label of the cluster around one conditional branch
///
/// Always qualified by the owning dag id; a root dag is shown as `0`
/// whichever sentinel id it was exported with.
fn branch_cluster_label(dag: &Dag, node: &Node, label: &str) -> String {
    let dag_id = if dag.is_root() { ROOT_DAG_ID } else { dag.id() };
    format!("{}.{}-{}", dag_id, node.index(), label)
}

fn node_cluster_label(dag: &Dag, node: &Node) -> String {
    let auto_named = node.id() == (node.index().saturating_sub(1)).to_string();
    match (dag.is_root(), auto_named) {
        (true, true) => node.index().to_string(),
        (true, false) => format!("{}-{}", node.index(), node.id()),
        (false, true) => format!("{}-{}", dag.id(), node.index()),
        (false, false) => format!("{}.{}-{}", dag.id(), node.index(), node.id()),
    }
}

fn indent(depth: usize) -> String {
    "\t".repeat(depth)
}

/// Escape text for a DOT double-quoted string
pub fn escape(s: &str) -> Cow<'_, str> {
    if s.contains(['"', '\\']) {
        Cow::Owned(s.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        Cow::Borrowed(s)
    }
}

/// Attribute values that are plain DOT identifiers go bare, the rest quoted
pub(crate) fn attr(value: &str) -> Cow<'_, str> {
    let plain = !value.is_empty()
        && !value.starts_with(|c: char| c.is_ascii_digit())
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    let numeral = !value.is_empty() && value.chars().all(|c| c.is_ascii_digit());
    if plain || numeral {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("\"{}\"", escape(value)))
    }
}
