// SPDX-License-Identifier: MIT

//! Vertex key derivation
//!
//! Every rendered vertex gets a key built from the id of the dag it lives
//! in, the node index, the operation index within the node and a tag. The
//! tuple is unique by construction (dag ids are unique along a nesting path,
//! indices are unique within a dag and within a node), so keys never collide
//! within one render.

use std::fmt;

use crate::dag::model::{is_root_dag_id, Operation, OperationKind};

/// What a vertex stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexTag<'a> {
    /// A concrete operation of an operation-chain node
    Operation(&'a Operation),
    /// Decision vertex of a conditional node
    Conditions,
    /// Entry vertex of a foreach node
    Foreach,
    /// Join vertex of a dynamic node
    End,
}

impl fmt::Display for VertexTag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexTag::Operation(op) => match op.kind {
                OperationKind::Function => write!(f, "func-{}", op.name),
                OperationKind::Callback => write!(f, "callback-{}", op.name),
                OperationKind::Modifier => write!(f, "modifier"),
            },
            VertexTag::Conditions => write!(f, "conditions"),
            VertexTag::Foreach => write!(f, "foreach"),
            VertexTag::End => write!(f, "end"),
        }
    }
}

/// Build the key of a vertex
///
/// Synthetic vertices pass `op_index == 0`. Keys in the root dag omit the
/// dag id segment.
pub fn vertex_key(dag_id: &str, node_index: usize, op_index: usize, tag: VertexTag<'_>) -> String {
    if is_root_dag_id(dag_id) {
        format!("{}.{}-{}", node_index, op_index, tag)
    } else if op_index == 0 {
        format!("{}.{}-{}", dag_id, node_index, tag)
    } else {
        format!("{}.{}.{}-{}", dag_id, node_index, op_index, tag)
    }
}
