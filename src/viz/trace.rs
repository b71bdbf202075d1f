// SPDX-License-Identifier: MIT

//! Per-request timing breakdown from tracing data
//!
//! Input is the JSON a Jaeger query returns for a flow function. Every flow
//! request is one trace whose root span (span id equal to trace id) is named
//! after the request id; the remaining spans are named after the dag nodes
//! they executed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dag::error::{FlowError, TraceError};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Span {
    #[serde(rename = "traceID")]
    pub trace_id: String,
    #[serde(rename = "spanID")]
    pub span_id: String,
    #[serde(rename = "operationName")]
    pub operation_name: String,
    /// Microseconds since the unix epoch
    #[serde(rename = "startTime", default)]
    pub start_time: i64,
    /// Microseconds
    #[serde(default)]
    pub duration: i64,
}

impl Span {
    fn end_time(&self) -> i64 {
        self.start_time.saturating_add(self.duration)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TraceItem {
    #[serde(rename = "traceID")]
    pub trace_id: String,
    #[serde(default)]
    pub spans: Vec<Span>,
}

/// Query result holding any number of traces
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TraceData {
    #[serde(default)]
    pub data: Vec<TraceItem>,
}

impl TraceData {
    pub fn from_json(content: &str) -> Result<Self, FlowError> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Time window one dag node was active within a request
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct NodeTrace {
    #[serde(rename = "start-time")]
    pub start_time: i64,
    pub duration: i64,
}

impl NodeTrace {
    fn end_time(&self) -> i64 {
        self.start_time.saturating_add(self.duration)
    }

    /// Grow the window to cover `span` as well
    fn merge(&mut self, span: &Span) {
        let start = self.start_time.min(span.start_time);
        let end = self.end_time().max(span.end_time());
        self.start_time = start;
        self.duration = end.saturating_sub(start);
    }
}

impl From<&Span> for NodeTrace {
    fn from(span: &Span) -> Self {
        Self {
            start_time: span.start_time,
            duration: span.duration,
        }
    }
}

/// Timing breakdown of a single flow request
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RequestTrace {
    #[serde(rename = "request-id")]
    pub request_id: String,
    #[serde(rename = "trace-id")]
    pub trace_id: String,
    #[serde(rename = "traces")]
    pub node_traces: BTreeMap<String, NodeTrace>,
    #[serde(rename = "start-time")]
    pub start_time: i64,
    pub duration: i64,
    #[serde(default)]
    pub status: String,
}

impl RequestTrace {
    /// Wall-clock start of the request
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.start_time)
    }
}

/// Status reported until something upstream knows better
pub const STATUS_UNKNOWN: &str = "unknown";

fn is_root_span(span: &Span, trace_id: &str) -> bool {
    span.trace_id == trace_id && span.span_id == trace_id
}

/// Map each request id to the trace recording it
///
/// Traces without a root span are skipped.
pub fn list_requests(traces: &TraceData) -> BTreeMap<String, String> {
    traces
        .data
        .iter()
        .filter_map(|item| {
            item.spans
                .iter()
                .find(|span| is_root_span(span, &item.trace_id))
                .map(|root| (root.operation_name.clone(), item.trace_id.clone()))
        })
        .collect()
}

/// Build the timing breakdown of the request recorded under `trace_id`
pub fn request_trace(traces: &TraceData, trace_id: &str) -> Result<RequestTrace, TraceError> {
    let item = traces.data.first().ok_or(TraceError::EmptyData)?;
    if item.trace_id != trace_id {
        return Err(TraceError::TraceMismatch {
            expected: trace_id.to_string(),
            found: item.trace_id.clone(),
        });
    }

    let mut response = RequestTrace {
        trace_id: trace_id.to_string(),
        status: STATUS_UNKNOWN.to_string(),
        ..Default::default()
    };
    let mut last_span_end = 0;

    for span in &item.spans {
        if is_root_span(span, trace_id) {
            response.request_id = span.operation_name.clone();
            response.start_time = span.start_time;
            last_span_end = last_span_end.max(span.start_time);
            continue;
        }

        last_span_end = last_span_end.max(span.end_time());
        response
            .node_traces
            .entry(span.operation_name.clone())
            .and_modify(|node| node.merge(span))
            .or_insert_with(|| NodeTrace::from(span));
    }

    response.duration = last_span_end.saturating_sub(response.start_time);
    log::debug!(
        "trace '{}' covers {} nodes over {}us",
        trace_id,
        response.node_traces.len(),
        response.duration
    );
    Ok(response)
}
