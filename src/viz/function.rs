// SPDX-License-Identifier: MIT

//! Flow function catalogue

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label that marks a deployed function as a flow
pub const FLOW_LABEL: &str = "faas-flow";
/// Annotation carrying the human readable flow description
pub const DESCRIPTION_ANNOTATION: &str = "faas-flow-desc";

/// A deployed function as listed by the gateway
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct FlowFunction {
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(rename = "invocationCount", default)]
    pub invocation_count: f64,
    #[serde(default)]
    pub replicas: u64,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl FlowFunction {
    pub fn is_flow(&self) -> bool {
        self.labels.get(FLOW_LABEL).map(String::as_str) == Some("1")
    }
}

/// Keep only the functions labelled as flows
pub fn filter_flow_functions<I>(functions: I) -> Vec<FlowFunction>
where
    I: IntoIterator<Item = FlowFunction>,
{
    functions.into_iter().filter(FlowFunction::is_flow).collect()
}

pub fn find_function<'a>(functions: &'a [FlowFunction], name: &str) -> Option<&'a FlowFunction> {
    functions.iter().find(|f| f.name == name)
}

/// Description of a flow together with its rendered graph
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FlowDesc {
    pub name: String,
    pub image: String,
    pub description: String,
    #[serde(rename = "invocation-count")]
    pub invocation_count: f64,
    pub replicas: u64,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dot: Option<String>,
}

impl FlowDesc {
    pub fn new(function: &FlowFunction, dot: Option<String>) -> Self {
        Self {
            name: function.name.clone(),
            image: function.image.clone(),
            description: function
                .annotations
                .get(DESCRIPTION_ANNOTATION)
                .cloned()
                .unwrap_or_default(),
            invocation_count: function.invocation_count,
            replicas: function.replicas,
            labels: function.labels.clone(),
            annotations: function.annotations.clone(),
            dot,
        }
    }
}
