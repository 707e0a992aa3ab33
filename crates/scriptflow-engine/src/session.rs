use crate::{EngineError, RunReport, WorkflowExecutor};
use scriptflow_core::{DiagramEvent, EventOutcome, GraphStore, SubstitutionRule};
use scriptflow_runner::{HttpScriptRunner, ScriptRunner};
use tracing::debug;

/// Editing session: the graph, its substitution rules and the executor that
/// runs them. Diagram events go through [`Session::dispatch`].
pub struct Session<R: ScriptRunner = HttpScriptRunner> {
    store: GraphStore,
    rules: Vec<SubstitutionRule>,
    executor: WorkflowExecutor<R>,
}

impl<R: ScriptRunner> Session<R> {
    pub fn new(
        store: GraphStore,
        rules: Vec<SubstitutionRule>,
        executor: WorkflowExecutor<R>,
    ) -> Self {
        Self {
            store,
            rules,
            executor,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn rules(&self) -> &[SubstitutionRule] {
        &self.rules
    }

    pub fn executor(&self) -> &WorkflowExecutor<R> {
        &self.executor
    }

    pub fn is_busy(&self) -> bool {
        self.executor.is_busy()
    }

    /// Apply a diagram event. `Execute` runs the whole graph and returns its report.
    pub async fn dispatch(&mut self, event: DiagramEvent) -> Result<Option<RunReport>, EngineError> {
        debug!("Dispatching diagram event: {:?}", event);
        match self.store.handle(event) {
            EventOutcome::Applied => Ok(None),
            EventOutcome::ExecuteRequested => {
                let report = self.executor.execute(&mut self.store, &self.rules).await?;
                Ok(Some(report))
            }
        }
    }
}
