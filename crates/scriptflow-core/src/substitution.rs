//! Passing results between nodes by splicing them into script text.
//!
//! A rule names an upstream node, a field of that node's result, and a
//! placeholder literal in the downstream script. Substitution is purely
//! textual: the field is serialized as compact JSON and replaces the first
//! occurrence of the placeholder. A missing upstream result or field leaves
//! the script as written.

use crate::{Node, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Structured result returned by the script runner for one node.
pub type ScriptOutput = Map<String, Value>;

/// Results recorded during a single run, keyed by node id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunResults(HashMap<NodeId, ScriptOutput>);

impl RunResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node_id: NodeId, output: ScriptOutput) {
        self.0.insert(node_id, output);
    }

    pub fn get(&self, node_id: &NodeId) -> Option<&ScriptOutput> {
        self.0.get(node_id)
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.0.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up `field` in the result of `node_id`. JSON `null` counts as absent.
    pub fn field(&self, node_id: &NodeId, field: &str) -> Option<&Value> {
        self.0
            .get(node_id)?
            .get(field)
            .filter(|value| !value.is_null())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRule {
    /// Upstream node whose result is read.
    pub source: NodeId,
    pub field: String,
    /// Downstream node whose script is rewritten.
    pub target: NodeId,
    pub placeholder: String,
}

impl SubstitutionRule {
    pub fn new(
        source: impl Into<NodeId>,
        field: impl Into<String>,
        target: impl Into<NodeId>,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            field: field.into(),
            target: target.into(),
            placeholder: placeholder.into(),
        }
    }

    /// Rewrite `script` with the upstream value, or return it unchanged.
    pub fn apply(&self, results: &RunResults, script: &str) -> String {
        let Some(value) = results.field(&self.source, &self.field) else {
            debug!(
                "No {}.{} result for node {}, keeping placeholder",
                self.source, self.field, self.target
            );
            return script.to_string();
        };

        if !script.contains(&self.placeholder) {
            debug!(
                "Placeholder {:?} not found in script of node {}",
                self.placeholder, self.target
            );
            return script.to_string();
        }

        script.replacen(&self.placeholder, &value.to_string(), 1)
    }
}

/// Build the script to execute for `node`, threading every rule that targets
/// it through in declaration order. Returns `None` for nodes without a script.
pub fn resolve_script(
    rules: &[SubstitutionRule],
    results: &RunResults,
    node: &Node,
) -> Option<String> {
    let script = node.script.as_deref()?;
    Some(
        rules
            .iter()
            .filter(|rule| rule.target == node.id)
            .fold(script.to_string(), |script, rule| {
                rule.apply(results, &script)
            }),
    )
}
