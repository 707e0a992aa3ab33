use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to send script request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Script runner returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse script runner response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Script runner returned a non-object payload: {0}")]
    UnexpectedPayload(String),

    #[error("Script execution failed: {0}")]
    Execution(String),
}
