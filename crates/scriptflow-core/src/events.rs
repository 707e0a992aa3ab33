use crate::{Connection, EdgeChange, EdgeId, GraphStore, NodeChange};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Gestures reported by the diagram surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagramEvent {
    NodesChange { changes: Vec<NodeChange> },
    EdgesChange { changes: Vec<EdgeChange> },
    Connect { connection: Connection },
    ReconnectStart { edge_id: EdgeId },
    Reconnect { edge_id: EdgeId, connection: Connection },
    ReconnectEnd { edge_id: EdgeId },
    /// Secondary click on an edge: unconditional delete.
    EdgeContextMenu { edge_id: EdgeId },
    Execute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    /// The store has nothing to do for this event; the caller should start a run.
    ExecuteRequested,
}

impl GraphStore {
    /// Route a diagram event to the matching graph mutation.
    pub fn handle(&mut self, event: DiagramEvent) -> EventOutcome {
        match event {
            DiagramEvent::NodesChange { changes } => self.apply_node_changes(&changes),
            DiagramEvent::EdgesChange { changes } => self.apply_edge_changes(&changes),
            DiagramEvent::Connect { connection } => self.connect(&connection),
            DiagramEvent::ReconnectStart { edge_id } => {
                debug!("Reconnect drag started on edge {}", edge_id);
                self.reconnect.start(edge_id);
            }
            DiagramEvent::Reconnect {
                edge_id,
                connection,
            } => {
                self.reconnect.confirm();
                self.reconnect(&edge_id, &connection);
            }
            DiagramEvent::ReconnectEnd { edge_id } => {
                if let Some(dropped) = self.reconnect.finish(&edge_id) {
                    debug!("Reconnect of edge {} ended off-target, deleting", dropped);
                    self.remove_edge(&dropped);
                }
            }
            DiagramEvent::EdgeContextMenu { edge_id } => self.remove_edge(&edge_id),
            DiagramEvent::Execute => return EventOutcome::ExecuteRequested,
        }
        EventOutcome::Applied
    }
}
