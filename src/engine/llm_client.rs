use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::config::AppConfig;
use crate::engine::prompt_builder::PromptRequest;
use crate::engine::templates::TemplateStore;

/// Prefix of every text produced in place of a failed generation.
pub const ERROR_MARKER: &str = "[错误]";

#[derive(Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub struct Choice {
    pub message: ChatMessageResponse,
}

#[derive(Deserialize)]
pub struct ChatMessageResponse {
    pub content: Option<String>,
}

/// Raw remote completion call. Errors are allowed here; `TextGenerationClient`
/// turns them into sentinel output.
pub trait ChatBackend {
    fn complete(&self, system: &str, prompt: &str, want_json: bool) -> Result<String>;

    /// Cheap reachability check shown in the settings panel.
    fn test_connection(&self) -> Result<String> {
        Ok("No connection check for this backend".into())
    }
}

/// OpenAI-compatible chat completions endpoint.
pub struct OpenAiBackend {
    client: Client,
    config: AppConfig,
}

impl OpenAiBackend {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout_secs.map(Duration::from_secs))
            .build()
            .context("building HTTP client")?;
        Ok(Self { client, config })
    }
}

impl ChatBackend for OpenAiBackend {
    fn test_connection(&self) -> Result<String> {
        let resp: serde_json::Value = self
            .client
            .get(self.config.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .send()?
            .error_for_status()?
            .json()?;

        Ok(format!(
            "Connected ({} models available)",
            resp["data"].as_array().map(|a| a.len()).unwrap_or(0)
        ))
    }

    fn complete(&self, system: &str, prompt: &str, want_json: bool) -> Result<String> {
        let req = ChatCompletionRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: system.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: prompt.into(),
                },
            ],
            response_format: want_json.then(|| ResponseFormat {
                kind: "json_object".into(),
            }),
        };

        let resp = self
            .client
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&req)
            .send()
            .context("sending chat completion")?
            .error_for_status()
            .context("chat completion rejected")?
            .json::<ChatCompletionResponse>()
            .context("decoding chat completion")?;

        let choice = resp
            .choices
            .into_iter()
            .next()
            .context("chat completion returned no choices")?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

/// Expected shape of the agent's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    GuideJson,
    StrategistJson,
}

impl OutputFormat {
    fn wants_json(self) -> bool {
        !matches!(self, OutputFormat::Text)
    }

    /// Stand-in answer when the backend call failed, shaped like what the
    /// calling agent expects so parsing still succeeds.
    fn failure_payload(self, detail: &str) -> String {
        let diagnostic = format!("{ERROR_MARKER} {detail}");
        match self {
            OutputFormat::Text => diagnostic,
            OutputFormat::GuideJson => json!({
                "guidance_suggestions": [diagnostic],
                "memory_summary_curr": diagnostic,
            })
            .to_string(),
            OutputFormat::StrategistJson => json!({
                "progression_directives": {
                    "next_scene_directive": diagnostic,
                    "next_thought_directive": diagnostic,
                    "is_end": "No",
                }
            })
            .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    /// Set when `text` is a sentinel rather than a model answer.
    pub error: Option<String>,
}

/// Fills templates and calls the backend. Never returns an error.
pub struct TextGenerationClient<B> {
    backend: B,
    templates: TemplateStore,
}

impl<B: ChatBackend> TextGenerationClient<B> {
    pub fn new(backend: B, templates: TemplateStore) -> Self {
        Self { backend, templates }
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn generate(&self, request: &PromptRequest, format: OutputFormat) -> Generation {
        let prompt = self.templates.render(request.key, &request.bindings);
        let persona = request.key.persona();

        tracing::debug!(agent = request.key.agent(), ?format, "calling backend");

        match self.backend.complete(persona, &prompt, format.wants_json()) {
            Ok(text) => Generation { text, error: None },
            Err(err) => {
                let detail = format!("{err:#}");
                tracing::warn!(agent = request.key.agent(), "generation failed: {detail}");
                Generation {
                    text: format.failure_payload(&detail),
                    error: Some(detail),
                }
            }
        }
    }
}
