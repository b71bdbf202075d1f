// SPDX-License-Identifier: MIT

//! Render styling configuration
//!
//! All colors, shapes and graph-level attributes used by the renderer live
//! here and are passed in explicitly. A style file only needs to name the
//! top-level sections it wants to change:
//!
//! ```yaml
//! edge_color: "#000000"
//! operation:
//!   shape: box
//!   style: filled
//!   color: "#cccccc"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::dag::error::FlowError;

/// Shape, fill style and color of one class of vertex
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct VertexStyle {
    pub shape: String,
    pub style: String,
    pub color: String,
}

impl VertexStyle {
    fn new(shape: &str, style: &str, color: &str) -> Self {
        Self {
            shape: shape.to_string(),
            style: style.to_string(),
            color: color.to_string(),
        }
    }
}

/// Border color and style of a cluster
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ClusterStyle {
    pub color: String,
    pub style: String,
}

/// Attributes written once in the graph header
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GraphAttributes {
    pub rankdir: String,
    pub pack: String,
    pub pad: String,
    pub nodesep: String,
    pub ranksep: String,
    pub splines: String,
    pub fontname: String,
    pub fontcolor: String,
    /// Default attributes for every vertex
    pub node_style: String,
    pub node_fontname: String,
    pub node_fontcolor: String,
}

impl Default for GraphAttributes {
    fn default() -> Self {
        Self {
            rankdir: "TD".to_string(),
            pack: "1".to_string(),
            pad: "0".to_string(),
            nodesep: "0".to_string(),
            ranksep: "0".to_string(),
            splines: "curved".to_string(),
            fontname: "Courier New".to_string(),
            fontcolor: "#44413b".to_string(),
            node_style: "filled".to_string(),
            node_fontname: "Courier".to_string(),
            node_fontcolor: "black".to_string(),
        }
    }
}

/// Complete styling for one render
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RenderStyle {
    pub graph: GraphAttributes,
    pub operation: VertexStyle,
    pub condition: VertexStyle,
    pub foreach: VertexStyle,
    /// Join vertex closing a conditional or foreach node
    pub dynamic_end: VertexStyle,
    pub node_cluster: ClusterStyle,
    pub condition_cluster: ClusterStyle,
    pub edge_color: String,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            graph: GraphAttributes::default(),
            operation: VertexStyle::new("rectangle", "filled", "#68b8e2"),
            condition: VertexStyle::new("diamond", "filled", "#f9af4d"),
            foreach: VertexStyle::new("diamond", "filled", "#f9af4d"),
            dynamic_end: VertexStyle::new("invhouse", "filled", "pink"),
            node_cluster: ClusterStyle {
                color: "grey".to_string(),
                style: "rounded".to_string(),
            },
            condition_cluster: ClusterStyle {
                color: "grey".to_string(),
                style: "rounded".to_string(),
            },
            edge_color: "#152730".to_string(),
        }
    }
}

impl RenderStyle {
    /// Parse a style from YAML; omitted sections keep their defaults
    pub fn from_yaml_str(content: &str) -> Result<Self, FlowError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a style file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, FlowError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}
