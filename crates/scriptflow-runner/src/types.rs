use serde::{Deserialize, Serialize};

pub use scriptflow_core::ScriptOutput;

/// Body of a script execution request: `{"script": "..."}`.
///
/// Nodes without a script send an empty object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

impl ScriptRequest {
    pub fn new(script: Option<String>) -> Self {
        Self { script }
    }

    pub fn script_len(&self) -> usize {
        self.script.as_ref().map_or(0, String::len)
    }
}
