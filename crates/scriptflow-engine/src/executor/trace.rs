use super::{ExecutorEvent, WorkflowExecutor};
use scriptflow_core::ScriptOutput;
use scriptflow_runner::ScriptRunner;
use serde_json::Value;
use tracing::{error, info, warn};

impl<R: ScriptRunner> WorkflowExecutor<R> {
    pub(crate) fn emit(&self, event: ExecutorEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            error!("Failed to send executor event: {}", e);
        }
    }

    pub(crate) fn log(&self, msg: impl Into<String>) {
        let msg = msg.into();
        info!("{}", msg);
        self.emit(ExecutorEvent::Log(msg));
    }

    pub(crate) fn warn(&self, msg: impl Into<String>) {
        let msg = msg.into();
        warn!("{}", msg);
        self.emit(ExecutorEvent::Warning(msg));
    }

    /// Compact JSON rendering of a node result, used as its display label.
    pub(crate) fn render_label(output: &ScriptOutput) -> String {
        Value::Object(output.clone()).to_string()
    }
}
