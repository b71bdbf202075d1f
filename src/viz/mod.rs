// SPDX-License-Identifier: MIT

//! Flow visualization
//!
//! This module provides:
//! - `DotGenerator` - renders dags (or their JSON exports) into DOT documents
//! - `RenderStyle` - the palette and graph attributes used while rendering
//! - `request_trace` / `list_requests` - per-request timing from trace data
//! - `FlowSource` - where exports, catalogues and traces are read from

pub mod dot;
pub mod function;
pub mod key;
pub mod render;
pub mod source;
pub mod style;
pub mod trace;

pub use dot::{make_dot_graph, DotGenerator};
pub use function::{filter_flow_functions, find_function, FlowDesc, FlowFunction};
pub use key::{vertex_key, VertexTag};
pub use render::GraphRenderer;
pub use source::{describe_flow, list_flows, DirectorySource, FlowSource};
pub use style::RenderStyle;
pub use trace::{list_requests, request_trace, NodeTrace, RequestTrace, TraceData};
