use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

// =============================================================================
// Identifiers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Conventional edge id for a connection: `{source}-{target}`.
    pub fn between(source: &NodeId, target: &NodeId) -> Self {
        Self(format!("{}-{}", source, target))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// =============================================================================
// Nodes & edges
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    /// Display text. Overwritten with the rendered result after a successful run.
    pub label: String,
    /// Payload sent to the script runner. May contain a placeholder that a
    /// [`SubstitutionRule`](crate::SubstitutionRule) fills in before execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub dragging: bool,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, position: Position, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position,
            label: label.into(),
            script: None,
            selected: false,
            dragging: false,
        }
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    #[default]
    Default,
    /// Interactive edge: reconnectable by dragging, deletable by context menu.
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type", default)]
    pub edge_type: EdgeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub selected: bool,
}

impl Edge {
    pub fn custom(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: EdgeId::between(&source, &target),
            source,
            target,
            edge_type: EdgeType::Custom,
            label: None,
            selected: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Endpoints proposed by a connect or reconnect gesture. Either side may be
/// missing when the gesture ends somewhere other than a node handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: Option<NodeId>,
    pub target: Option<NodeId>,
}

impl Connection {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: Some(source.into()),
            target: Some(target.into()),
        }
    }

    fn endpoints(&self) -> Option<(&NodeId, &NodeId)> {
        Some((self.source.as_ref()?, self.target.as_ref()?))
    }
}

// =============================================================================
// Change batches
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeChange {
    Add {
        item: Node,
    },
    Remove {
        id: NodeId,
    },
    Replace {
        item: Node,
    },
    Position {
        id: NodeId,
        position: Option<Position>,
        #[serde(default)]
        dragging: bool,
    },
    Select {
        id: NodeId,
        selected: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeChange {
    Add { item: Edge },
    Remove { id: EdgeId },
    Replace { item: Edge },
    Select { id: EdgeId, selected: bool },
}

/// Apply a node change batch in order and return the resulting collection.
///
/// Changes that reference an unknown id are skipped, as are `Add` changes for
/// an id that is already present.
pub fn apply_node_changes(changes: &[NodeChange], nodes: &[Node]) -> Vec<Node> {
    let mut next = nodes.to_vec();
    for change in changes {
        match change {
            NodeChange::Add { item } => {
                if next.iter().any(|n| n.id == item.id) {
                    debug!("Ignoring add of existing node {}", item.id);
                } else {
                    next.push(item.clone());
                }
            }
            NodeChange::Remove { id } => next.retain(|n| &n.id != id),
            NodeChange::Replace { item } => {
                if let Some(node) = next.iter_mut().find(|n| n.id == item.id) {
                    *node = item.clone();
                }
            }
            NodeChange::Position {
                id,
                position,
                dragging,
            } => {
                if let Some(node) = next.iter_mut().find(|n| &n.id == id) {
                    if let Some(position) = position {
                        node.position = *position;
                    }
                    node.dragging = *dragging;
                }
            }
            NodeChange::Select { id, selected } => {
                if let Some(node) = next.iter_mut().find(|n| &n.id == id) {
                    node.selected = *selected;
                }
            }
        }
    }
    next
}

/// Apply an edge change batch in order and return the resulting collection.
pub fn apply_edge_changes(changes: &[EdgeChange], edges: &[Edge]) -> Vec<Edge> {
    let mut next = edges.to_vec();
    for change in changes {
        match change {
            EdgeChange::Add { item } => {
                if next.iter().any(|e| e.id == item.id) {
                    debug!("Ignoring add of existing edge {}", item.id);
                } else {
                    next.push(item.clone());
                }
            }
            EdgeChange::Remove { id } => next.retain(|e| &e.id != id),
            EdgeChange::Replace { item } => {
                if let Some(edge) = next.iter_mut().find(|e| e.id == item.id) {
                    *edge = item.clone();
                }
            }
            EdgeChange::Select { id, selected } => {
                if let Some(edge) = next.iter_mut().find(|e| &e.id == id) {
                    edge.selected = *selected;
                }
            }
        }
    }
    next
}

/// Append a custom edge for `connection`.
///
/// Connections missing an endpoint are dropped silently, and a connection
/// between nodes that are already connected is not duplicated.
pub fn add_edge(connection: &Connection, edges: &[Edge]) -> Vec<Edge> {
    let Some((source, target)) = connection.endpoints() else {
        debug!("Dropping connection without both endpoints: {:?}", connection);
        return edges.to_vec();
    };

    if edges
        .iter()
        .any(|e| &e.source == source && &e.target == target)
    {
        debug!("Edge {} -> {} already exists", source, target);
        return edges.to_vec();
    }

    let mut next = edges.to_vec();
    next.push(Edge::custom(source.clone(), target.clone()));
    next
}

/// Swap the endpoints of `old_id` for those of `connection`.
///
/// The old edge is removed and a copy carrying the new endpoints (and the id
/// derived from them) is appended, so type and label survive the move.
/// Moving an edge onto a connection another edge already has merges the two:
/// the old edge is dropped and the existing one is kept as is.
pub fn reconnect_edge(old_id: &EdgeId, connection: &Connection, edges: &[Edge]) -> Vec<Edge> {
    let Some(old) = edges.iter().find(|e| &e.id == old_id) else {
        warn!("Cannot reconnect unknown edge {}", old_id);
        return edges.to_vec();
    };
    let Some((source, target)) = connection.endpoints() else {
        warn!("Cannot reconnect edge {} to an incomplete connection", old_id);
        return edges.to_vec();
    };

    let replacement = Edge {
        id: EdgeId::between(source, target),
        source: source.clone(),
        target: target.clone(),
        ..old.clone()
    };

    let remaining = edges.iter().filter(|e| &e.id != old_id).cloned();
    if edges
        .iter()
        .any(|e| &e.id != old_id && e.id == replacement.id)
    {
        debug!(
            "Edge {} already exists, merging reconnected edge {}",
            replacement.id, old_id
        );
        return remaining.collect();
    }

    remaining
        .chain(std::iter::once(replacement))
        .collect()
}
