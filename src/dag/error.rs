// SPDX-License-Identifier: MIT

//! Typed error handling for flowviz-rs
//!
//! `FlowError` is what the public entry points return. The narrower enums
//! describe one failure domain each and convert into it with `?`.

use thiserror::Error;

/// Top-level error type for flowviz-rs
#[derive(Debug, Error)]
pub enum FlowError {
    /// The dag export (or another JSON document) could not be decoded
    #[error("failed to decode document: {0}")]
    Decode(#[from] serde_json::Error),

    /// The export decoded but describes an invalid dag
    #[error("invalid dag structure: {0}")]
    Structure(#[from] DagError),

    /// Pipeline state could not be resolved against its dag
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Trace data could not be turned into a request breakdown
    #[error("trace error: {0}")]
    Trace(#[from] TraceError),

    /// Flow function missing from the catalogue
    #[error("flow function '{0}' not found")]
    FunctionNotFound(String),

    /// Function or trace name that cannot be used as a document file name
    #[error("invalid document name '{0}'")]
    InvalidName(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing errors (style configuration)
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Structural errors found while validating an exported dag
#[derive(Debug, Error, PartialEq)]
pub enum DagError {
    /// A start node or child id that is not part of the dag
    #[error("dag '{dag}' references unknown node '{reference}'")]
    UnresolvedReference { dag: String, reference: String },

    /// Two nodes of one dag share an index
    #[error("dag '{dag}' has more than one node with index {index}")]
    DuplicateIndex { dag: String, index: usize },

    /// Foreach node without a nested dag
    #[error("foreach node '{node}' in dag '{dag}' has no sub-dag")]
    MissingSubDag { dag: String, node: String },

    /// Conditional node without branches
    #[error("conditional node '{node}' in dag '{dag}' has no conditional dags")]
    MissingConditionalDags { dag: String, node: String },

    /// Dynamic node that is neither a condition nor a foreach (or both)
    #[error("dynamic node '{node}' in dag '{dag}' must be exactly one of condition or foreach")]
    InvalidDynamicNode { dag: String, node: String },

    /// Static node with neither a sub-dag nor operations
    #[error("node '{node}' in dag '{dag}' has no operations")]
    EmptyNode { dag: String, node: String },

    /// Every node declares children, so the dag has no terminal vertex
    #[error("dag '{dag}' has no node without children")]
    NoTerminalNode { dag: String },
}

/// Errors raised while resolving the pipeline execution position
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    /// No node recorded for a depth that is within the execution depth
    #[error("no execution position recorded at depth {depth}")]
    MissingPosition { depth: usize },

    /// The recorded node id does not exist in the dag at that depth
    #[error("node '{node}' not found in dag '{dag}' at depth {depth}")]
    NodeNotFound {
        depth: usize,
        dag: String,
        node: String,
    },

    /// Execution descends into a node that has no nested dag
    #[error("node '{node}' has no nested dag to descend into")]
    NotNested { node: String },

    /// A conditional node was entered before a branch was chosen
    #[error("no dynamic option chosen for node '{node}'")]
    MissingDynamicOption { node: String },

    /// The chosen branch label does not exist on the conditional node
    #[error("node '{node}' has no branch '{option}'")]
    UnknownBranch { node: String, option: String },

    /// A dependency was resolved for a node that never registered any
    #[error("no dynamic dependency registered for node '{node}'")]
    UnknownDependency { node: String },

    /// Decrementing the execution depth below the root
    #[error("execution depth cannot go below zero")]
    DepthUnderflow,
}

/// Errors raised while aggregating trace data
#[derive(Debug, Error, PartialEq)]
pub enum TraceError {
    /// The trace service returned no trace items
    #[error("no trace data in result")]
    EmptyData,

    /// The first trace item is not the requested trace
    #[error("invalid request trace '{found}', expected '{expected}'")]
    TraceMismatch { expected: String, found: String },
}
