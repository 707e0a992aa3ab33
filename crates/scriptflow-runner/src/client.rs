use crate::{RunnerError, ScriptOutput, ScriptRequest, ScriptRunner};
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub base_url: String,
    pub execute_path: String,
    pub api_key: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            execute_path: "/execute".to_string(),
            api_key: None,
        }
    }
}

impl RunnerConfig {
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.execute_path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

/// Script runner reached over HTTP: `POST {endpoint}` with a JSON
/// [`ScriptRequest`], answered by a JSON object.
pub struct HttpScriptRunner {
    config: RunnerConfig,
    http: reqwest::Client,
}

impl HttpScriptRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RunnerConfig {
        &mut self.config
    }
}

impl ScriptRunner for HttpScriptRunner {
    fn name(&self) -> &str {
        &self.config.base_url
    }

    async fn run_script(&self, request: &ScriptRequest) -> Result<ScriptOutput, RunnerError> {
        let url = self.config.endpoint();

        debug!(
            "Script request to {}: {} bytes",
            url,
            request.script_len()
        );

        let mut req_builder = self.http.post(&url).json(request);

        if let Some(api_key) = &self.config.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        let response = req_builder.send().await.map_err(RunnerError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RunnerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await.map_err(RunnerError::Decode)?;

        match payload {
            Value::Object(output) => {
                info!("Script response: {} field(s)", output.len());
                Ok(output)
            }
            other => Err(RunnerError::UnexpectedPayload(other.to_string())),
        }
    }
}
