//! Bedrock Runtime `Converse` engine with a local tool loop.

use std::sync::OnceLock;

use chrono::Utc;
use futures::stream::BoxStream;
use percent_encoding::utf8_percent_encode;
use regex::Regex;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::engine::{AgentEngine, AgentExecution, AgentSpec};
use super::events::AgentEvent;
use super::message::{EngineMessage, ToolResultBlock, ToolUseBlock};
use crate::aws::sigv4::URI_UNRESERVED;
use crate::aws::{sha256_hex, sign_request, AwsCredentials, SigningParams};
use crate::error::{GatewayError, Result};
use crate::tools::{ToolArguments, ToolExecutionContext};

const SIGNING_SERVICE: &str = "bedrock";
const STOP_REASON_TOOL_USE: &str = "tool_use";

fn region_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d+$").expect("region pattern is valid"))
}

/// Production engine backed by Bedrock `Converse`.
pub struct BedrockAgentEngine {
    client: reqwest::Client,
    credentials: AwsCredentials,
    max_turns: usize,
    endpoint: Option<String>,
}

impl BedrockAgentEngine {
    pub fn new(credentials: AwsCredentials, max_turns: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            max_turns,
            endpoint: None,
        }
    }

    /// Send every request to `endpoint` instead of the regional Bedrock host.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn validate(spec: &AgentSpec) -> Result<()> {
        if spec.model.model_id.trim().is_empty() {
            return Err(GatewayError::AgentConstruction(
                "model id must not be empty".into(),
            ));
        }
        if !region_pattern().is_match(&spec.model.region) {
            return Err(GatewayError::AgentConstruction(format!(
                "invalid region '{}'",
                spec.model.region
            )));
        }
        Ok(())
    }
}

impl AgentEngine for BedrockAgentEngine {
    fn create(&self, spec: AgentSpec) -> Result<Box<dyn AgentExecution>> {
        Self::validate(&spec)?;
        let base_url = match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", spec.model.region),
        };
        let url = format!(
            "{base_url}/model/{}/converse",
            utf8_percent_encode(&spec.model.model_id, URI_UNRESERVED)
        );
        let url = reqwest::Url::parse(&url)
            .map_err(|e| GatewayError::AgentConstruction(format!("invalid model endpoint: {e}")))?;

        Ok(Box::new(BedrockExecution {
            client: self.client.clone(),
            credentials: self.credentials.clone(),
            max_turns: self.max_turns,
            url,
            spec,
        }))
    }
}

struct BedrockExecution {
    client: reqwest::Client,
    credentials: AwsCredentials,
    max_turns: usize,
    url: reqwest::Url,
    spec: AgentSpec,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConverseRequest<'a> {
    messages: &'a [EngineMessage],
    system: Vec<SystemBlock<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<ToolConfig>,
}

#[derive(Serialize)]
struct SystemBlock<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct ToolConfig {
    tools: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseResponse {
    output: ConverseOutput,
    stop_reason: String,
}

#[derive(Debug, Deserialize)]
struct ConverseOutput {
    message: EngineMessage,
}

impl BedrockExecution {
    fn tool_config(&self) -> Option<ToolConfig> {
        if self.spec.tools.is_empty() {
            return None;
        }
        let tools = self
            .spec
            .tools
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "toolSpec": {
                        "name": tool.name(),
                        "description": tool.description(),
                        "inputSchema": { "json": tool.parameters().schema },
                    }
                })
            })
            .collect();
        Some(ToolConfig { tools })
    }

    async fn converse(&self, messages: &[EngineMessage]) -> Result<ConverseResponse> {
        let body = serde_json::to_vec(&ConverseRequest {
            messages,
            system: vec![SystemBlock {
                text: &self.spec.system_prompt,
            }],
            tool_config: self.tool_config(),
        })?;
        let payload_hash = sha256_hex(&body);

        let mut request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .build()?;
        sign_request(
            &mut request,
            &payload_hash,
            &SigningParams {
                credentials: &self.credentials,
                region: &self.spec.model.region,
                service: SIGNING_SERVICE,
                time: Utc::now(),
            },
        )?;

        let response = self.client.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    async fn run_tool(&self, tool_use: &ToolUseBlock) -> ToolResultBlock {
        let ctx = ToolExecutionContext::for_session(&self.spec.session_id);
        let outcome = match self.spec.tools.iter().find(|t| t.name() == tool_use.name) {
            Some(tool) => {
                tool.execute(&ToolArguments::new(tool_use.input.clone()), &ctx)
                    .await
            }
            None => Err(GatewayError::tool_invocation(&tool_use.name, "unknown tool")),
        };

        match outcome {
            Ok(value) => ToolResultBlock::success(&tool_use.tool_use_id, value),
            Err(e) => {
                warn!(
                    session_id = %self.spec.session_id,
                    tool = %tool_use.name,
                    error = %e,
                    "tool call failed"
                );
                ToolResultBlock::error(&tool_use.tool_use_id, e.to_string())
            }
        }
    }
}

impl AgentExecution for BedrockExecution {
    fn stream(self: Box<Self>, prompt: String) -> BoxStream<'static, Result<AgentEvent>> {
        let stream = async_stream::stream! {
            yield Ok(AgentEvent::init_event_loop());

            let mut messages = self.spec.messages.clone();
            messages.push(EngineMessage::user_text(prompt));

            for turn in 0..self.max_turns {
                let response = match self.converse(&messages).await {
                    Ok(response) => response,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                debug!(
                    session_id = %self.spec.session_id,
                    turn,
                    stop_reason = %response.stop_reason,
                    "converse turn complete"
                );

                let assistant = response.output.message;
                yield Ok(AgentEvent::message(&assistant));

                if response.stop_reason != STOP_REASON_TOOL_USE {
                    yield Ok(AgentEvent::result(&response.stop_reason));
                    return;
                }

                let mut results = Vec::new();
                for tool_use in assistant.tool_uses() {
                    results.push(self.run_tool(tool_use).await);
                }
                messages.push(assistant);

                let tool_message = EngineMessage::tool_results(results);
                yield Ok(AgentEvent::message(&tool_message));
                messages.push(tool_message);
            }

            yield Err(GatewayError::Stream(format!(
                "agent did not finish within {} turns",
                self.max_turns
            )));
        };
        Box::pin(stream)
    }
}
