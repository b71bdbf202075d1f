// SPDX-License-Identifier: MIT

//! DOT document generation
//!
//! Wraps the renderer output in the graph header and closing brace. Input is
//! either an already validated `Dag` or the raw JSON export; decoding and
//! structural validation both happen before anything is rendered, so a failed
//! call never yields a partial document.

use once_cell::sync::Lazy;
use std::fmt::Write;

use crate::dag::error::FlowError;
use crate::dag::export::DagExport;
use crate::dag::model::Dag;
use crate::viz::render::{attr, GraphRenderer};
use crate::viz::style::{GraphAttributes, RenderStyle};

/// Turns dags into complete DOT documents
#[derive(Debug, Clone, Default)]
pub struct DotGenerator {
    style: RenderStyle,
}

impl DotGenerator {
    pub fn new(style: RenderStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    /// Render a validated dag
    pub fn generate(&self, dag: &Dag) -> String {
        let mut doc = header(&self.style.graph);

        let mut renderer = GraphRenderer::new(&self.style);
        renderer.render_dag(dag, 1);
        doc.push_str(renderer.output());
        doc.push_str("}\n");

        log::debug!("rendered dag '{}' into {} bytes", dag.id(), doc.len());
        doc
    }

    /// Decode, validate and render a JSON export
    pub fn generate_from_json(&self, content: &str) -> Result<String, FlowError> {
        let dag = DagExport::from_json(content)?.into_dag()?;
        Ok(self.generate(&dag))
    }

    pub fn generate_from_slice(&self, content: &[u8]) -> Result<String, FlowError> {
        let dag = DagExport::from_slice(content)?.into_dag()?;
        Ok(self.generate(&dag))
    }
}

static DEFAULT_GENERATOR: Lazy<DotGenerator> = Lazy::new(DotGenerator::default);

/// Render a JSON export with the default style
pub fn make_dot_graph(content: &str) -> Result<String, FlowError> {
    DEFAULT_GENERATOR.generate_from_json(content)
}

fn header(graph: &GraphAttributes) -> String {
    let mut out = String::from("digraph depgraph {\n");
    for (name, value) in [
        ("rankdir", &graph.rankdir),
        ("pack", &graph.pack),
        ("pad", &graph.pad),
        ("nodesep", &graph.nodesep),
        ("ranksep", &graph.ranksep),
        ("splines", &graph.splines),
        ("fontname", &graph.fontname),
        ("fontcolor", &graph.fontcolor),
    ] {
        let _ = writeln!(out, "\t{}={};", name, attr(value));
    }
    let _ = writeln!(
        out,
        "\tnode [style={} fontname={} fontcolor={}]",
        attr(&graph.node_style),
        attr(&graph.node_fontname),
        attr(&graph.node_fontcolor)
    );
    out
}
