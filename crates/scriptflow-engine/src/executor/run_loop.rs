use super::{
    EngineError, ExecutorEvent, ExecutorState, NodeOutcome, NodeStatus, RunReport,
    WorkflowExecutor,
};
use chrono::Utc;
use scriptflow_core::{
    GraphStore, Node, RunResults, SubstitutionRule, lint_graph, resolve_script,
};
use scriptflow_runner::{ScriptRequest, ScriptRunner};
use std::collections::VecDeque;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

/// Holds the busy flag for the lifetime of a run, including an abandoned one.
struct RunGuard<'a> {
    state_tx: &'a watch::Sender<ExecutorState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state_tx.send_replace(ExecutorState::Idle);
    }
}

impl<R: ScriptRunner> WorkflowExecutor<R> {
    fn begin_run(&self) -> Option<RunGuard<'_>> {
        let started = self.state_tx.send_if_modified(|state| {
            if *state == ExecutorState::Running {
                return false;
            }
            *state = ExecutorState::Running;
            true
        });
        started.then_some(RunGuard {
            state_tx: &self.state_tx,
        })
    }

    /// Run every node of `store` once, in declaration order.
    ///
    /// Nodes are queued from a snapshot taken at the trigger and executed one
    /// at a time; the next node is not started until the runner call for the
    /// current one has settled. A failed node records no result and the run
    /// moves on. Successful nodes get their label replaced in `store`.
    pub async fn execute(
        &self,
        store: &mut GraphStore,
        rules: &[SubstitutionRule],
    ) -> Result<RunReport, EngineError> {
        let Some(guard) = self.begin_run() else {
            warn!("Execute triggered while a run is in progress");
            return Err(EngineError::AlreadyRunning);
        };

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        self.emit(ExecutorEvent::StateChanged(ExecutorState::Running));
        self.emit(ExecutorEvent::RunStarted(run_id));

        let snapshot = store.snapshot();
        for warning in lint_graph(&snapshot.nodes, &snapshot.edges, rules) {
            self.warn(warning.to_string());
        }

        let mut queue: VecDeque<Node> = snapshot.nodes.into();
        self.log(format!(
            "Starting run {}: {} node(s) in declaration order",
            run_id,
            queue.len()
        ));

        let mut results = RunResults::new();
        let mut outcomes = Vec::with_capacity(queue.len());

        while let Some(node) = queue.pop_front() {
            let outcome = self.execute_node(&node, rules, &mut results, store).await;
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
        self.log(format!(
            "Run {} finished: {} node(s), {} failed",
            run_id,
            outcomes.len(),
            failed
        ));

        drop(guard);
        self.emit(ExecutorEvent::StateChanged(ExecutorState::Idle));
        self.emit(ExecutorEvent::WorkflowCompleted(run_id));

        Ok(RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            outcomes,
            results,
        })
    }

    async fn execute_node(
        &self,
        node: &Node,
        rules: &[SubstitutionRule],
        results: &mut RunResults,
        store: &mut GraphStore,
    ) -> NodeOutcome {
        self.emit(ExecutorEvent::NodeStarted(node.id.clone()));

        let resolved_script = resolve_script(rules, results, node);
        let request = ScriptRequest::new(resolved_script.clone());

        info!(node_id = %node.id, runner = self.runner.name(), "Executing node");

        match self.runner.run_script(&request).await {
            Ok(output) => {
                let label = Self::render_label(&output);
                if !store.set_node_label(&node.id, label.clone()) {
                    warn!(node_id = %node.id, "Node removed before its label could be updated");
                }
                results.insert(node.id.clone(), output.clone());
                self.emit(ExecutorEvent::NodeCompleted {
                    node_id: node.id.clone(),
                    label,
                    output: output.clone(),
                });
                NodeOutcome {
                    node_id: node.id.clone(),
                    resolved_script,
                    status: NodeStatus::Succeeded(output),
                }
            }
            Err(e) => {
                let error = e.to_string();
                warn!(node_id = %node.id, "Node failed: {}", error);
                self.emit(ExecutorEvent::NodeFailed {
                    node_id: node.id.clone(),
                    error: error.clone(),
                });
                NodeOutcome {
                    node_id: node.id.clone(),
                    resolved_script,
                    status: NodeStatus::Failed(error),
                }
            }
        }
    }
}
