// SPDX-License-Identifier: MIT

//! Flow dag model
//!
//! This module provides:
//! - `DagExport` - the JSON shape a flow function exports
//! - `Dag` / `Node` / `Operation` - the validated, read-only model
//! - `Pipeline` - execution position tracking over a dag

pub mod error;
pub mod export;
pub mod model;
pub mod pipeline;

pub use error::{DagError, FlowError, PipelineError, TraceError};
pub use export::{DagExport, NodeExport, OperationExport};
pub use model::{Dag, Node, NodeKind, Operation, OperationKind, ROOT_DAG_ID};
pub use pipeline::{DepthChange, Pipeline, PipelineState};
