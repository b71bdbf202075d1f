// SPDX-License-Identifier: MIT

//! In-memory dag model
//!
//! A `Dag` owns its nodes in an arena (`Vec<Node>` sorted by index) and
//! cross-references them by position. Nested dags are owned by the node
//! that wraps them, so the structure is a tree of dags with no sharing.
//! Instances are only built through `DagExport::into_dag`, which enforces
//! the invariants the renderer relies on.

use std::collections::{BTreeMap, HashMap};

/// Id the exporter gives the top-level dag
pub const ROOT_DAG_ID: &str = "0";

/// What an operation does when executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    /// Invocation of a named function
    Function,
    /// Call to a named callback endpoint
    Callback,
    /// Unnamed data modifier
    Modifier,
}

/// A single unit of work inside a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub name: String,
}

impl Operation {
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Function,
            name: name.into(),
        }
    }

    pub fn callback(name: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Callback,
            name: name.into(),
        }
    }

    pub fn modifier() -> Self {
        Self {
            kind: OperationKind::Modifier,
            name: String::new(),
        }
    }
}

/// The four shapes a node can take
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Ordered, non-empty chain of operations
    Operations(Vec<Operation>),
    /// Static nested dag
    SubDag(Box<Dag>),
    /// One nested dag per condition label; exactly one runs
    Conditional(BTreeMap<String, Dag>),
    /// Nested dag executed once per item
    Foreach(Box<Dag>),
}

/// A vertex group of a dag
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) index: usize,
    pub(crate) id: String,
    pub(crate) unique_id: String,
    pub(crate) children: Vec<usize>,
    pub(crate) kind: NodeKind,
}

impl Node {
    /// 1-based position of the node within its dag
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id that is unique across every nested dag of a flow
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, NodeKind::Conditional(_) | NodeKind::Foreach(_))
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Nested dag a static sub-dag or foreach node descends into
    pub fn sub_dag(&self) -> Option<&Dag> {
        match &self.kind {
            NodeKind::SubDag(dag) | NodeKind::Foreach(dag) => Some(dag.as_ref()),
            _ => None,
        }
    }

    /// Branch dag for a condition label
    pub fn conditional_dag(&self, label: &str) -> Option<&Dag> {
        match &self.kind {
            NodeKind::Conditional(branches) => branches.get(label),
            _ => None,
        }
    }
}

/// A named collection of nodes with a designated start node
#[derive(Debug, Clone)]
pub struct Dag {
    pub(crate) id: String,
    pub(crate) nodes: Vec<Node>,
    pub(crate) start: usize,
    pub(crate) lookup: HashMap<String, usize>,
}

impl Dag {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True for the top-level dag, whose id is left out of vertex keys
    pub fn is_root(&self) -> bool {
        is_root_dag_id(&self.id)
    }

    /// Nodes in ascending index order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.lookup.get(id).map(|&pos| &self.nodes[pos])
    }

    pub fn start_node(&self) -> &Node {
        &self.nodes[self.start]
    }

    /// Declared successors of `node`, in declaration order
    pub fn children<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Node> + 'a {
        node.children.iter().map(move |&pos| &self.nodes[pos])
    }

    /// Number of nodes directly in this dag (nested dags not counted)
    pub fn count_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Walk static sub-dags from `node` down to the first node that either
    /// carries operations or is dynamic, returning it with its owning dag.
    pub fn entry<'a>(&'a self, node: &'a Node) -> (&'a Dag, &'a Node) {
        let mut dag = self;
        let mut node = node;
        while let NodeKind::SubDag(sub) = &node.kind {
            dag = sub.as_ref();
            node = sub.start_node();
        }
        (dag, node)
    }

    /// Unique ids of every node, descending into all nested dags and
    /// every conditional branch
    pub fn unique_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.collect_unique_ids(&mut ids);
        ids
    }

    fn collect_unique_ids(&self, ids: &mut Vec<String>) {
        for node in &self.nodes {
            ids.push(node.unique_id.clone());
            match &node.kind {
                NodeKind::SubDag(sub) | NodeKind::Foreach(sub) => sub.collect_unique_ids(ids),
                NodeKind::Conditional(branches) => {
                    for branch in branches.values() {
                        branch.collect_unique_ids(ids);
                    }
                }
                NodeKind::Operations(_) => {}
            }
        }
    }
}

/// The exporter names the top-level dag "0"; an empty id is treated the same
pub fn is_root_dag_id(id: &str) -> bool {
    id.is_empty() || id == ROOT_DAG_ID
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::export::DagExport;
    use serde_json::json;

    fn nested_dag() -> Dag {
        let export: DagExport = serde_json::from_value(json!({
            "Id": "0",
            "StartNode": "wrap",
            "Nodes": {
                "wrap": {
                    "Id": "wrap", "Index": 1, "Childrens": ["tail"],
                    "SubDag": {
                        "Id": "1",
                        "StartNode": "inner",
                        "Nodes": {
                            "inner": {
                                "Id": "inner", "Index": 1,
                                "Operations": [{"IsFunction": true, "Name": "f"}]
                            }
                        }
                    }
                },
                "tail": {
                    "Id": "tail", "Index": 2,
                    "Operations": [{"IsCallback": true, "Name": "cb"}]
                }
            }
        }))
        .unwrap();
        export.into_dag().unwrap()
    }

    #[test]
    fn test_root_dag_id() {
        assert!(is_root_dag_id("0"));
        assert!(is_root_dag_id(""));
        assert!(!is_root_dag_id("1"));
    }

    #[test]
    fn test_nodes_in_index_order() {
        let dag = nested_dag();
        let ids: Vec<&str> = dag.nodes().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["wrap", "tail"]);
        assert_eq!(dag.count_nodes(), 2);
    }

    #[test]
    fn test_entry_unwraps_static_sub_dag() {
        let dag = nested_dag();
        let (owner, node) = dag.entry(dag.start_node());
        assert_eq!(owner.id(), "1");
        assert_eq!(node.id(), "inner");
    }

    #[test]
    fn test_children_resolve_to_nodes() {
        let dag = nested_dag();
        let wrap = dag.node("wrap").unwrap();
        let children: Vec<&str> = dag.children(wrap).map(|n| n.id()).collect();
        assert_eq!(children, vec!["tail"]);
        assert!(!dag.node("tail").unwrap().has_children());
    }

    #[test]
    fn test_unique_ids_are_recursive() {
        let dag = nested_dag();
        assert_eq!(dag.unique_ids(), vec!["0_wrap", "1_inner", "0_tail"]);
    }

    #[test]
    fn test_node_kind_accessors() {
        let export: DagExport = serde_json::from_value(json!({
            "Id": "0",
            "StartNode": "cond",
            "Nodes": {
                "cond": {
                    "Id": "cond", "Index": 1, "IsDynamic": true, "IsCondition": true,
                    "Childrens": ["loop"],
                    "ConditionalDags": {
                        "yes": {"Id": "1-yes", "StartNode": "y",
                                "Nodes": {"y": {"Id": "y", "Index": 1,
                                                "Operations": [{"IsFunction": true, "Name": "y"}]}}}
                    }
                },
                "loop": {
                    "Id": "loop", "Index": 2, "IsDynamic": true, "IsForeach": true,
                    "SubDag": {"Id": "2", "StartNode": "w",
                               "Nodes": {"w": {"Id": "w", "Index": 1,
                                               "Operations": [{"IsFunction": true, "Name": "w"}]}}}
                }
            }
        }))
        .unwrap();
        let dag = export.into_dag().unwrap();

        let cond = dag.node("cond").unwrap();
        assert!(cond.is_dynamic());
        assert!(cond.sub_dag().is_none());
        assert_eq!(cond.conditional_dag("yes").map(|d| d.id()), Some("1-yes"));
        assert!(cond.conditional_dag("no").is_none());

        let each = dag.node("loop").unwrap();
        assert!(each.is_dynamic());
        assert_eq!(each.sub_dag().map(|d| d.id()), Some("2"));
        assert!(each.conditional_dag("yes").is_none());

        let nested = nested_dag();
        let wrap = nested.node("wrap").unwrap();
        assert!(!wrap.is_dynamic());
        assert_eq!(wrap.sub_dag().map(|d| d.id()), Some("1"));
        assert!(!nested.node("tail").unwrap().is_dynamic());
    }

    #[test]
    fn test_operation_constructors() {
        assert_eq!(Operation::function("f").kind, OperationKind::Function);
        assert_eq!(Operation::callback("cb").name, "cb");
        assert_eq!(Operation::modifier().kind, OperationKind::Modifier);
    }
}
