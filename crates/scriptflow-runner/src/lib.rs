mod client;
mod error;
mod types;

pub use client::*;
pub use error::*;
pub use types::*;

use std::future::Future;

/// The remote execution service that evaluates a node's script.
pub trait ScriptRunner {
    fn name(&self) -> &str;

    fn run_script(
        &self,
        request: &ScriptRequest,
    ) -> impl Future<Output = Result<ScriptOutput, RunnerError>> + Send;
}
