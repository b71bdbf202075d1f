// SPDX-License-Identifier: MIT

//! Exported dag document
//!
//! This module contains the serde shapes of the JSON export produced for a
//! flow function, and the validation that turns them into the `Dag` model.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::error::{DagError, FlowError};
use super::model::{Dag, Node, NodeKind, Operation, OperationKind};

/// Top-level (or nested) dag as exported
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DagExport {
    pub id: String,
    #[serde(default)]
    pub start_node: String,
    pub nodes: HashMap<String, NodeExport>,
}

/// A node as exported; the flags select which of the optional parts apply
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeExport {
    #[serde(default)]
    pub id: String,
    pub index: usize,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub is_dynamic: bool,
    #[serde(default)]
    pub is_condition: bool,
    #[serde(default)]
    pub is_foreach: bool,
    #[serde(default)]
    pub sub_dag: Option<Box<DagExport>>,
    #[serde(default)]
    pub conditional_dags: Option<HashMap<String, DagExport>>,
    #[serde(default)]
    pub operations: Option<Vec<OperationExport>>,
    #[serde(default)]
    pub childrens: Option<Vec<String>>,
}

/// An operation as exported
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct OperationExport {
    #[serde(default)]
    pub is_function: bool,
    #[serde(default)]
    pub is_callback: bool,
    #[serde(default)]
    pub name: String,
}

impl From<OperationExport> for Operation {
    fn from(op: OperationExport) -> Self {
        let kind = if op.is_function {
            OperationKind::Function
        } else if op.is_callback {
            OperationKind::Callback
        } else {
            OperationKind::Modifier
        };
        Operation {
            kind,
            name: op.name,
        }
    }
}

impl DagExport {
    /// Decode an export document from JSON text
    pub fn from_json(content: &str) -> Result<Self, FlowError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Decode an export document from raw bytes
    pub fn from_slice(content: &[u8]) -> Result<Self, FlowError> {
        Ok(serde_json::from_slice(content)?)
    }

    /// Validate the export and convert it into the dag model
    pub fn into_dag(self) -> Result<Dag, DagError> {
        let dag_id = self.id;

        // Sort by index so the arena order is the render order
        let mut entries: Vec<(String, NodeExport)> = self.nodes.into_iter().collect();
        entries.sort_by(|a, b| a.1.index.cmp(&b.1.index).then_with(|| a.0.cmp(&b.0)));

        let lookup: HashMap<String, usize> = entries
            .iter()
            .enumerate()
            .map(|(pos, (key, _))| (key.clone(), pos))
            .collect();

        let resolve = |reference: &str| {
            lookup
                .get(reference)
                .copied()
                .ok_or_else(|| DagError::UnresolvedReference {
                    dag: dag_id.clone(),
                    reference: reference.to_string(),
                })
        };

        let start = resolve(&self.start_node)?;

        let mut nodes = Vec::with_capacity(entries.len());
        let mut previous_index = None;
        for (key, export) in entries {
            let index = export.index;
            if previous_index == Some(index) {
                return Err(DagError::DuplicateIndex {
                    dag: dag_id.clone(),
                    index,
                });
            }
            previous_index = Some(index);

            let children = export
                .childrens
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|child| resolve(child))
                .collect::<Result<Vec<_>, _>>()?;

            let id = if export.id.is_empty() {
                key
            } else {
                export.id.clone()
            };
            let unique_id = export
                .unique_id
                .clone()
                .unwrap_or_else(|| format!("{}_{}", dag_id, id));
            let kind = node_kind(&dag_id, &id, export)?;

            nodes.push(Node {
                index,
                id,
                unique_id,
                children,
                kind,
            });
        }

        if nodes.iter().all(|n| n.has_children()) {
            return Err(DagError::NoTerminalNode { dag: dag_id });
        }

        log::debug!("validated dag '{}' with {} nodes", dag_id, nodes.len());

        Ok(Dag {
            id: dag_id,
            nodes,
            start,
            lookup,
        })
    }
}

impl TryFrom<DagExport> for Dag {
    type Error = DagError;

    fn try_from(export: DagExport) -> Result<Self, Self::Error> {
        export.into_dag()
    }
}

/// Collapse the exporter's flag combination into exactly one node kind
fn node_kind(dag_id: &str, node_id: &str, export: NodeExport) -> Result<NodeKind, DagError> {
    let invalid_dynamic = || DagError::InvalidDynamicNode {
        dag: dag_id.to_string(),
        node: node_id.to_string(),
    };

    if export.is_dynamic {
        return match (export.is_condition, export.is_foreach) {
            (true, false) => {
                let branches = export.conditional_dags.unwrap_or_default();
                if branches.is_empty() {
                    return Err(DagError::MissingConditionalDags {
                        dag: dag_id.to_string(),
                        node: node_id.to_string(),
                    });
                }
                let branches = branches
                    .into_iter()
                    .map(|(label, branch)| branch.into_dag().map(|dag| (label, dag)))
                    .collect::<Result<BTreeMap<_, _>, DagError>>()?;
                Ok(NodeKind::Conditional(branches))
            }
            (false, true) => {
                let sub = export.sub_dag.ok_or_else(|| DagError::MissingSubDag {
                    dag: dag_id.to_string(),
                    node: node_id.to_string(),
                })?;
                Ok(NodeKind::Foreach(Box::new(sub.into_dag()?)))
            }
            _ => Err(invalid_dynamic()),
        };
    }

    if let Some(sub) = export.sub_dag {
        return Ok(NodeKind::SubDag(Box::new(sub.into_dag()?)));
    }

    let operations: Vec<Operation> = export
        .operations
        .unwrap_or_default()
        .into_iter()
        .map(Operation::from)
        .collect();
    if operations.is_empty() {
        return Err(DagError::EmptyNode {
            dag: dag_id.to_string(),
            node: node_id.to_string(),
        });
    }
    Ok(NodeKind::Operations(operations))
}
