//! Tracking for an in-flight edge reconnection drag.
//!
//! Dragging an edge endpoint either lands on a valid handle (the edge is
//! rewired when `Reconnect` fires) or ends over empty canvas, in which case the
//! dragged edge is deleted. The tracker only remembers which of the two
//! happened between drag-start and drag-end.

use crate::EdgeId;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum ReconnectState {
    #[default]
    Idle,
    Dragging {
        edge_id: EdgeId,
        confirmed: bool,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ReconnectTracker {
    state: ReconnectState,
}

impl ReconnectTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ReconnectState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ReconnectState::Dragging { .. })
    }

    /// Drag-start on an existing edge endpoint. Any previous gesture is discarded.
    pub fn start(&mut self, edge_id: EdgeId) {
        self.state = ReconnectState::Dragging {
            edge_id,
            confirmed: false,
        };
    }

    /// The drag produced a valid new connection.
    pub fn confirm(&mut self) {
        if let ReconnectState::Dragging { confirmed, .. } = &mut self.state {
            *confirmed = true;
        }
    }

    /// Drag-end. Returns the edge to delete when no reattachment was confirmed.
    ///
    /// Always leaves the tracker `Idle`. Ending a drag that was never started
    /// counts as confirmed, so nothing is deleted.
    pub fn finish(&mut self, edge_id: &EdgeId) -> Option<EdgeId> {
        match std::mem::take(&mut self.state) {
            ReconnectState::Dragging {
                confirmed: false, ..
            } => Some(edge_id.clone()),
            _ => None,
        }
    }
}
