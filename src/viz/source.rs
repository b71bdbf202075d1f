// SPDX-License-Identifier: MIT

//! Where flow documents come from
//!
//! The renderer and the trace breakdown only consume JSON documents. A
//! `FlowSource` hands them out; `DirectorySource` serves them from a
//! directory of dumps laid out as:
//!
//! ```text
//! <root>/functions.json          function catalogue
//! <root>/dags/<function>.json    dag export of a flow
//! <root>/requests/<function>.json traces listing the requests of a flow
//! <root>/traces/<trace id>.json  trace of a single request
//! ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::dag::error::FlowError;
use crate::viz::dot::DotGenerator;
use crate::viz::function::{filter_flow_functions, find_function, FlowDesc, FlowFunction};
use crate::viz::trace::TraceData;

/// Provider of the documents a flow dashboard needs
#[async_trait]
pub trait FlowSource: Send + Sync {
    /// Raw dag export of a flow function
    async fn dag_export(&self, function: &str) -> Result<String, FlowError>;

    /// Every deployed function, flows or not
    async fn functions(&self) -> Result<Vec<FlowFunction>, FlowError>;

    /// Traces of the requests a flow function served
    async fn requests(&self, function: &str) -> Result<TraceData, FlowError>;

    /// Trace of a single request
    async fn trace(&self, trace_id: &str) -> Result<TraceData, FlowError>;
}

/// Serves documents from JSON files on disk
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `<root>/<dir>/<name>.json`
    ///
    /// Names must stay a single file name inside `dir`.
    fn document_path(&self, dir: &str, name: &str) -> Result<PathBuf, FlowError> {
        if name.is_empty() || name.contains(['/', '\\', '\0']) || name.contains("..") {
            return Err(FlowError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(dir).join(format!("{}.json", name)))
    }

    async fn read(&self, path: PathBuf) -> Result<String, FlowError> {
        log::debug!("reading {}", path.display());
        Ok(tokio::fs::read_to_string(&path).await?)
    }
}

#[async_trait]
impl FlowSource for DirectorySource {
    async fn dag_export(&self, function: &str) -> Result<String, FlowError> {
        self.read(self.document_path("dags", function)?).await
    }

    async fn functions(&self) -> Result<Vec<FlowFunction>, FlowError> {
        let content = self.read(self.root.join("functions.json")).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn requests(&self, function: &str) -> Result<TraceData, FlowError> {
        let content = self.read(self.document_path("requests", function)?).await?;
        TraceData::from_json(&content)
    }

    async fn trace(&self, trace_id: &str) -> Result<TraceData, FlowError> {
        let content = self.read(self.document_path("traces", trace_id)?).await?;
        TraceData::from_json(&content)
    }
}

/// Flow functions known to `source`
pub async fn list_flows(source: &dyn FlowSource) -> Result<Vec<FlowFunction>, FlowError> {
    Ok(filter_flow_functions(source.functions().await?))
}

/// Look up a flow and render its dag into a description
pub async fn describe_flow(
    source: &dyn FlowSource,
    generator: &DotGenerator,
    name: &str,
) -> Result<FlowDesc, FlowError> {
    let functions = list_flows(source).await?;
    let function = find_function(&functions, name)
        .ok_or_else(|| FlowError::FunctionNotFound(name.to_string()))?;

    let export = source.dag_export(name).await?;
    let dot = generator.generate_from_json(&export)?;
    log::info!("described flow '{}'", name);

    Ok(FlowDesc::new(function, Some(dot)))
}
