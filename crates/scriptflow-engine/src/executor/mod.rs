mod run_loop;
mod trace;

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use scriptflow_core::{NodeId, RunResults, ScriptOutput};
use scriptflow_runner::{HttpScriptRunner, RunnerConfig, ScriptRunner};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::Sender;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutorState {
    #[default]
    Idle,
    Running,
}

/// Events sent from the executor back to the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExecutorEvent {
    RunStarted(Uuid),
    StateChanged(ExecutorState),
    Log(String),
    Warning(String),
    NodeStarted(NodeId),
    NodeCompleted {
        node_id: NodeId,
        label: String,
        output: ScriptOutput,
    },
    NodeFailed {
        node_id: NodeId,
        error: String,
    },
    WorkflowCompleted(Uuid),
}

impl ExecutorEvent {
    /// `Log` and `Warning` lines are already written through `tracing` by the
    /// executor before they are sent.
    pub fn is_traced(&self) -> bool {
        matches!(self, Self::Log(_) | Self::Warning(_))
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Workflow is already running")]
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeStatus {
    Succeeded(ScriptOutput),
    Failed(String),
}

/// What happened to one node during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeOutcome {
    pub node_id: NodeId,
    /// Script actually sent to the runner, after substitution.
    pub resolved_script: Option<String>,
    pub status: NodeStatus,
}

impl NodeOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, NodeStatus::Succeeded(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<NodeOutcome>,
    pub results: RunResults,
}

impl RunReport {
    pub fn outcome(&self, node_id: &NodeId) -> Option<&NodeOutcome> {
        self.outcomes.iter().find(|o| &o.node_id == node_id)
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded()).count()
    }
}

/// Runs every node of a graph, one at a time, against a [`ScriptRunner`].
pub struct WorkflowExecutor<R: ScriptRunner = HttpScriptRunner> {
    runner: R,
    event_tx: Sender<ExecutorEvent>,
    state_tx: watch::Sender<ExecutorState>,
}

impl WorkflowExecutor {
    pub fn new(config: RunnerConfig, event_tx: Sender<ExecutorEvent>) -> Self {
        Self::with_runner(HttpScriptRunner::new(config), event_tx)
    }
}

impl<R: ScriptRunner> WorkflowExecutor<R> {
    pub fn with_runner(runner: R, event_tx: Sender<ExecutorEvent>) -> Self {
        let (state_tx, _) = watch::channel(ExecutorState::Idle);
        Self {
            runner,
            event_tx,
            state_tx,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn state(&self) -> ExecutorState {
        *self.state_tx.borrow()
    }

    /// True from the execute trigger until every node has been attempted.
    pub fn is_busy(&self) -> bool {
        self.state() == ExecutorState::Running
    }

    pub fn subscribe(&self) -> watch::Receiver<ExecutorState> {
        self.state_tx.subscribe()
    }
}
