// SPDX-License-Identifier: MIT

//! Execution position tracking for a running flow
//!
//! A `Pipeline` records where execution currently is inside a (possibly
//! nested) dag, which branch each conditional node took, and how many
//! dependencies each dynamic fan-in point is still waiting for. The state
//! round-trips through a flat JSON document so an execution driver can
//! suspend and resume across independent invocations.
//!
//! The tracker does no locking: a concurrent driver must serialize its own
//! updates.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::error::{FlowError, PipelineError};
use super::model::{Dag, Node, NodeKind};

/// How an execution step moves between nesting levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthChange {
    /// Descend into a nested dag
    Increment,
    /// Return to the enclosing dag
    Decrement,
    /// Move within the current dag
    Same,
}

/// Serializable part of a pipeline
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PipelineState {
    /// Active node id per depth
    #[serde(rename = "pipeline-execution-position", default)]
    pub execution_position: BTreeMap<usize, String>,
    /// How many nested dag levels deep execution is
    #[serde(rename = "pipeline-execution-depth", default)]
    pub execution_depth: usize,
    /// Chosen branch label per dynamic node unique id
    #[serde(rename = "pipeline-dynamic-option", default)]
    pub current_dynamic_option: HashMap<String, String>,
    /// All branch labels per dynamic node unique id
    #[serde(rename = "pipeline-all-dynamic-options", default)]
    pub all_dynamic_option: HashMap<String, Vec<String>>,
    /// Remaining unmet dependencies per dynamic node unique id
    #[serde(rename = "pipeline-dynamic-dependency-count", default)]
    pub dynamic_dependency_count: HashMap<String, u32>,
}

/// Runtime tracker bound to the dag it walks
#[derive(Debug, Clone)]
pub struct Pipeline {
    dag: Dag,
    state: PipelineState,
}

impl Pipeline {
    /// Create a pipeline positioned on the dag's start node
    pub fn new(dag: Dag) -> Self {
        let mut state = PipelineState::default();
        state
            .execution_position
            .insert(0, dag.start_node().id().to_string());
        Self { dag, state }
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Id of the very first node of the pipeline
    pub fn initial_node_id(&self) -> &str {
        self.dag.start_node().id()
    }

    /// Number of nodes in the top-level dag (sub-dag nodes not counted)
    pub fn count_nodes(&self) -> usize {
        self.dag.count_nodes()
    }

    /// Unique ids of every node in the pipeline, nested ones included
    pub fn all_node_unique_ids(&self) -> Vec<String> {
        self.dag.unique_ids()
    }

    pub fn execution_depth(&self) -> usize {
        self.state.execution_depth
    }

    /// Resolve the node that is executing now, together with its dag
    ///
    /// Walks the recorded position one depth at a time, following sub-dag
    /// and foreach links, or the chosen branch of a conditional node.
    pub fn current_node_dag(&self) -> Result<(&Node, &Dag), PipelineError> {
        let mut dag = &self.dag;
        for depth in 0..self.state.execution_depth {
            let node = self.node_at(dag, depth)?;
            dag = match node.kind() {
                NodeKind::SubDag(sub) | NodeKind::Foreach(sub) => sub.as_ref(),
                NodeKind::Conditional(branches) => {
                    let option = self
                        .state
                        .current_dynamic_option
                        .get(node.unique_id())
                        .ok_or_else(|| PipelineError::MissingDynamicOption {
                            node: node.unique_id().to_string(),
                        })?;
                    branches
                        .get(option)
                        .ok_or_else(|| PipelineError::UnknownBranch {
                            node: node.unique_id().to_string(),
                            option: option.clone(),
                        })?
                }
                NodeKind::Operations(_) => {
                    return Err(PipelineError::NotNested {
                        node: node.unique_id().to_string(),
                    })
                }
            };
        }
        let node = self.node_at(dag, self.state.execution_depth)?;
        Ok((node, dag))
    }

    fn node_at<'a>(&self, dag: &'a Dag, depth: usize) -> Result<&'a Node, PipelineError> {
        let id = self
            .state
            .execution_position
            .get(&depth)
            .ok_or(PipelineError::MissingPosition { depth })?;
        dag.node(id).ok_or_else(|| PipelineError::NodeNotFound {
            depth,
            dag: dag.id().to_string(),
            node: id.clone(),
        })
    }

    /// Adjust the depth and record `node_id` as active at the new depth
    pub fn update_execution_position(
        &mut self,
        change: DepthChange,
        node_id: &str,
    ) -> Result<(), PipelineError> {
        let depth = match change {
            DepthChange::Increment => self.state.execution_depth + 1,
            DepthChange::Decrement => self
                .state
                .execution_depth
                .checked_sub(1)
                .ok_or(PipelineError::DepthUnderflow)?,
            DepthChange::Same => self.state.execution_depth,
        };
        self.state.execution_depth = depth;
        self.state
            .execution_position
            .insert(depth, node_id.to_string());
        log::debug!("execution position at depth {} is now '{}'", depth, node_id);
        Ok(())
    }

    /// Record the branch a conditional node chose
    pub fn set_dynamic_option(&mut self, unique_id: &str, option: &str) {
        self.state
            .current_dynamic_option
            .insert(unique_id.to_string(), option.to_string());
    }

    pub fn dynamic_option(&self, unique_id: &str) -> Option<&str> {
        self.state
            .current_dynamic_option
            .get(unique_id)
            .map(|s| s.as_str())
    }

    /// Record every option a dynamic node produced
    pub fn set_all_dynamic_options(&mut self, unique_id: &str, options: Vec<String>) {
        self.state
            .all_dynamic_option
            .insert(unique_id.to_string(), options);
    }

    pub fn all_dynamic_options(&self, unique_id: &str) -> Option<&[String]> {
        self.state
            .all_dynamic_option
            .get(unique_id)
            .map(|v| v.as_slice())
    }

    /// Register how many dependencies a fan-in point waits for
    pub fn set_dynamic_dependency_count(&mut self, unique_id: &str, count: u32) {
        self.state
            .dynamic_dependency_count
            .insert(unique_id.to_string(), count);
    }

    /// Mark one dependency as met and return how many remain
    ///
    /// The fan-in point may proceed once this returns zero.
    pub fn resolve_dynamic_dependency(&mut self, unique_id: &str) -> Result<u32, PipelineError> {
        let count = self
            .state
            .dynamic_dependency_count
            .get_mut(unique_id)
            .ok_or_else(|| PipelineError::UnknownDependency {
                node: unique_id.to_string(),
            })?;
        *count = count.saturating_sub(1);
        Ok(*count)
    }

    /// Encode the state as JSON
    pub fn get_state(&self) -> Result<String, FlowError> {
        Ok(serde_json::to_string(&self.state)?)
    }

    /// Replace the state with a previously encoded one
    pub fn apply_state(&mut self, state: &str) -> Result<(), FlowError> {
        self.state = serde_json::from_str(state)?;
        Ok(())
    }
}
