//! Ollama chat client
//!
//! Local oracle. Private data never leaves the machine, so every prompt
//! tagged private is answered here.

use super::Oracle;
use crate::error::DialogError;
use crate::models::{Privacy, TurnMessage};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

pub struct OllamaClient {
    client: Client,
    chat_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            chat_url: format!("{}/api/chat", base_url.trim_end_matches('/')),
            model,
        })
    }

    fn build_request<'a>(&'a self, prompt: &'a str, history: &'a [TurnMessage]) -> ChatRequest<'a> {
        let mut messages: Vec<ChatMessage<'a>> = history
            .iter()
            .map(|m| ChatMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();

        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        }
    }
}

#[async_trait]
impl Oracle for OllamaClient {
    async fn complete(
        &self,
        prompt: &str,
        history: &[TurnMessage],
        _privacy: Privacy,
    ) -> Result<String> {
        let request = self.build_request(prompt, history);

        debug!(model = %self.model, history_len = history.len(), "Calling Ollama chat");

        let response = self
            .client
            .post(&self.chat_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Ollama request failed: {}", e);
                DialogError::LlmError(format!("Ollama request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "Ollama error response: {}", body);
            return Err(DialogError::LlmError(format!(
                "Ollama returned {}",
                status
            )));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            DialogError::LlmError(format!("Unexpected Ollama response format: {}", e))
        })?;

        chat.message
            .map(|m| m.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| DialogError::LlmError("No response from Ollama".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}
