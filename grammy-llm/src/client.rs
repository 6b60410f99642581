//! Chat-completion checker.
//!
//! Sends the text with a fixed system prompt, asks for a JSON object, and
//! returns the model's matches untouched. Validation and offset conversion
//! happen in the engine.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use grammy_api::{CheckerOutput, RawMatch};
use grammy_core::{Checker, CheckerError};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{LlmConfig, Provider};
use crate::history::{HistoryEntry, MessageHistory, Role};

const SYSTEM_PROMPT: &str = r#"You are a careful English writing assistant.
Your job: suggest minimal edits for grammar, clarity, and phrases that sound non-native/awkward.
Rules:
- Do NOT rewrite the whole text.
- Only propose small localized edits (replace a short span with a short span).
- Preserve the author's voice and meaning.
- Prefer fewer suggestions over many.
- Do not repeat suggestions the user already declined or applied.

Return ONLY valid JSON with this exact schema:
{
  "matches": [
    {
      "message": "...",
      "start": 0,
      "end": 0,
      "replacement": "..."
    }
  ]
}

Where start/end are CHARACTER indices (Unicode scalar value count) into the ORIGINAL input text. end is exclusive.
If there is nothing to change, return {"matches": []}.
"#;

const OPENROUTER_REFERER: &str = "https://github.com/grammy-app";
const OPENROUTER_TITLE: &str = "Grammy";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<HistoryEntry>,
    /// Some models reject any value but their default.
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// [`Checker`] backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct LlmChecker {
    http: reqwest::Client,
    config: LlmConfig,
    history: Mutex<MessageHistory>,
}

impl LlmChecker {
    pub fn new(config: LlmConfig) -> Result<Self, CheckerError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CheckerError::Transport(e.to_string()))?;

        tracing::info!(
            "LLM checker: provider={}, model={}, base={}",
            config.provider,
            config.model,
            config.api_base
        );

        Ok(Self {
            http,
            history: Mutex::new(MessageHistory::new(config.history_pairs)),
            config,
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Forget previous exchanges.
    pub fn clear_history(&self) {
        self.history().clear();
    }

    /// Number of exchanges that will be replayed with the next request.
    pub fn history_pairs(&self) -> usize {
        self.history().pairs()
    }

    fn history(&self) -> MutexGuard<'_, MessageHistory> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// List the models the provider offers, sorted by id. Without a key
    /// there is nobody to ask and the list is empty.
    pub async fn fetch_models(&self) -> Result<Vec<String>, CheckerError> {
        if self.config.api_key.trim().is_empty() {
            return Ok(Vec::new());
        }

        let response = self.get("models").send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| CheckerError::InvalidResponse(e.to_string()))?;
        let mut models: Vec<String> = list.data.into_iter().map(|m| m.id).collect();
        models.sort();
        tracing::debug!("{} offers {} model(s)", self.config.provider, models.len());
        Ok(models)
    }

    /// Verify the key is accepted and the configured model is offered.
    pub async fn test_connection(&self) -> Result<(), CheckerError> {
        if self.config.api_key.trim().is_empty() {
            return Err(CheckerError::MissingApiKey);
        }

        // OpenRouter lists models without auth; its key endpoint does not.
        let auth_path = match self.config.provider {
            Provider::OpenAi => "models",
            Provider::OpenRouter => "key",
        };
        tracing::debug!("Testing connection to {} via /{}", self.config.provider, auth_path);

        let response = self.get(auth_path).send().await.map_err(transport)?;
        if !response.status().is_success() {
            let err = status_error(response).await;
            tracing::warn!("Connection test failed: {}", err);
            return Err(err);
        }

        let models = self.fetch_models().await?;
        if !self.config.model.is_empty() && !models.contains(&self.config.model) {
            return Err(CheckerError::ModelNotFound {
                model: self.config.model.clone(),
                provider: self.config.provider.to_string(),
            });
        }

        tracing::info!(
            "Connection to {} ok, model {} available",
            self.config.provider,
            self.config.model
        );
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    fn endpoint(&self) -> String {
        self.url("chat/completions")
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let request = self.http.get(self.url(path)).bearer_auth(&self.config.api_key);
        self.attributed(request)
    }

    /// OpenRouter asks clients to identify themselves.
    fn attributed(&self, request: RequestBuilder) -> RequestBuilder {
        if self.config.provider == Provider::OpenRouter {
            request
                .header("HTTP-Referer", OPENROUTER_REFERER)
                .header("X-Title", OPENROUTER_TITLE)
        } else {
            request
        }
    }

    fn messages(&self, user: &str) -> Vec<HistoryEntry> {
        let mut messages = vec![HistoryEntry {
            role: Role::System,
            content: SYSTEM_PROMPT.to_string(),
        }];
        messages.extend(self.history().entries().cloned());
        messages.push(HistoryEntry {
            role: Role::User,
            content: user.to_string(),
        });
        messages
    }
}

#[async_trait]
impl Checker for LlmChecker {
    fn name(&self) -> &str {
        self.config.provider.name()
    }

    async fn check(&self, text: &str) -> Result<Vec<RawMatch>, CheckerError> {
        if self.config.api_key.trim().is_empty() {
            return Err(CheckerError::MissingApiKey);
        }

        let user = format!("Text:\n{}", text);
        let body = ChatRequest {
            model: &self.config.model,
            messages: self.messages(&user),
            temperature: None,
            response_format: Some(ResponseFormat {
                r#type: "json_object",
            }),
        };

        let request = self.attributed(
            self.http
                .post(self.endpoint())
                .bearer_auth(&self.config.api_key)
                .json(&body),
        );

        tracing::debug!(
            "Sending check to {} (text_len={}, messages={})",
            self.config.provider,
            text.len(),
            body.messages.len()
        );

        let response = request.send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| CheckerError::InvalidResponse(e.to_string()))?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| CheckerError::InvalidResponse("No content in response".to_string()))?;

        let output: CheckerOutput = serde_json::from_str(&content)
            .map_err(|e| CheckerError::InvalidResponse(format!("model returned non-JSON output: {}", e)))?;

        tracing::debug!("{} returned {} match(es)", self.config.provider, output.matches.len());
        self.history().push_pair(user, content);

        Ok(output.matches)
    }
}

fn transport(e: reqwest::Error) -> CheckerError {
    CheckerError::Transport(e.to_string())
}

async fn status_error(response: reqwest::Response) -> CheckerError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    CheckerError::Status {
        status,
        body: error_message(&body),
    }
}

/// The `error.message` (or top-level `message`) of a JSON error body, or
/// the body itself.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}
