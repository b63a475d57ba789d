use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use serde_json::Value;
use anyhow::{Result, anyhow};
use reqwest::Client;
use std::fmt::Debug;
use tracing::{info, warn};
use crate::compiler::aggregator::ExecutionPayload;
use crate::config::ExecutorSettings;
use crate::dsl::PipelineKind;

/// What the execution service hands back for one payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn ok(result: Value) -> Self {
        Self {
            success: true,
            result,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: Value::Null,
            error: Some(error.into()),
        }
    }
}

/// 外部执行服务接口
/// Runs the modeled computation for a payload. Transport failures are `Err`;
/// a computation the service itself rejected is `Ok` with `success == false`.
#[async_trait]
pub trait Executor: Send + Sync + Debug {
    async fn execute(&self, pipeline: PipelineKind, payload: &ExecutionPayload) -> Result<ExecutionResult>;
}

/// POSTs the payload as JSON to `{endpoint}/{pipeline}`.
#[derive(Debug)]
pub struct HttpExecutor {
    client: Client,
    endpoint: String,
}

impl HttpExecutor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn from_settings(settings: &ExecutorSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
        })
    }

    pub fn url_for(&self, pipeline: PipelineKind) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), pipeline)
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(&self, pipeline: PipelineKind, payload: &ExecutionPayload) -> Result<ExecutionResult> {
        let url = self.url_for(pipeline);
        info!(%url, "Dispatching payload");

        let response = self.client.post(&url).json(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // The service reports its own failures in the same envelope; fall back
        // to the raw body when it does not.
        match serde_json::from_str::<ExecutionResult>(&body) {
            Ok(result) => Ok(result),
            Err(_) if status.is_success() => {
                let result = serde_json::from_str(&body).unwrap_or(Value::String(body));
                Ok(ExecutionResult::ok(result))
            }
            Err(_) => {
                warn!(%url, status = status.as_u16(), "Execution service returned an error");
                Ok(ExecutionResult::failed(format!("HTTP {}: {}", status.as_u16(), body)))
            }
        }
    }
}
