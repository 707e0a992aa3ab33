mod executor;
mod session;

pub use executor::{
    EngineError, ExecutorEvent, ExecutorState, NodeOutcome, NodeStatus, RunReport,
    WorkflowExecutor,
};
pub use session::Session;
