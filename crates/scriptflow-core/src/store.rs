use crate::{
    Connection, Edge, EdgeChange, EdgeId, Node, NodeChange, NodeId, ReconnectState,
    ReconnectTracker, add_edge, apply_edge_changes, apply_node_changes, reconnect_edge,
};
use serde::{Deserialize, Serialize};

/// Owner of the current node and edge collections.
///
/// Every mutation goes through the change-application functions
/// ([`apply_node_changes`], [`apply_edge_changes`], [`add_edge`],
/// [`reconnect_edge`]).
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    pub(crate) reconnect: ReconnectTracker,
}

/// Read-only copy of the graph taken at the start of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphStore {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            nodes,
            edges,
            reconnect: ReconnectTracker::new(),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn find_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn find_edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    pub fn reconnect_state(&self) -> &ReconnectState {
        self.reconnect.state()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) {
        self.nodes = apply_node_changes(changes, &self.nodes);
    }

    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) {
        self.edges = apply_edge_changes(changes, &self.edges);
    }

    pub fn connect(&mut self, connection: &Connection) {
        self.edges = add_edge(connection, &self.edges);
    }

    pub fn reconnect(&mut self, old_id: &EdgeId, connection: &Connection) {
        self.edges = reconnect_edge(old_id, connection, &self.edges);
    }

    pub fn remove_edge(&mut self, id: &EdgeId) {
        self.apply_edge_changes(&[EdgeChange::Remove { id: id.clone() }]);
    }

    /// Replace a node's display label. Returns `false` if the node is gone.
    pub fn set_node_label(&mut self, id: &NodeId, label: impl Into<String>) -> bool {
        let Some(node) = self.find_node(id) else {
            return false;
        };
        let item = Node {
            label: label.into(),
            ..node.clone()
        };
        self.apply_node_changes(&[NodeChange::Replace { item }]);
        true
    }
}
