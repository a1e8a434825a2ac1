//! Language-model oracle
//!
//! The orchestrator treats the model as a black box: a prompt (plus optional
//! history) goes in, raw text comes out. Output may be malformed; callers
//! decide how to recover.

use crate::models::{Privacy, TurnMessage};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub mod gemini;
pub mod ollama;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Complete `prompt` given the prior `history`.
    ///
    /// `privacy` tells routing implementations whether the prompt may leave
    /// the machine.
    async fn complete(
        &self,
        prompt: &str,
        history: &[TurnMessage],
        privacy: Privacy,
    ) -> Result<String>;
}

/// Routes private prompts to the local model and public prompts to the
/// remote model when one is configured.
pub struct PrivacyRouter {
    local: Arc<dyn Oracle>,
    remote: Option<Arc<dyn Oracle>>,
}

impl PrivacyRouter {
    pub fn new(local: Arc<dyn Oracle>, remote: Option<Arc<dyn Oracle>>) -> Self {
        Self { local, remote }
    }

    fn select(&self, privacy: Privacy) -> &Arc<dyn Oracle> {
        match (privacy, &self.remote) {
            (Privacy::Public, Some(remote)) => remote,
            _ => &self.local,
        }
    }
}

#[async_trait]
impl Oracle for PrivacyRouter {
    async fn complete(
        &self,
        prompt: &str,
        history: &[TurnMessage],
        privacy: Privacy,
    ) -> Result<String> {
        let remote = privacy == Privacy::Public && self.remote.is_some();
        debug!(?privacy, remote, "Routing oracle request");
        self.select(privacy).complete(prompt, history, privacy).await
    }
}

/// Build the production oracle from configuration.
pub fn create_default_oracle(config: &crate::config::OracleConfig) -> Result<Arc<dyn Oracle>> {
    let local: Arc<dyn Oracle> = Arc::new(OllamaClient::new(
        config.ollama_url.clone(),
        config.ollama_model.clone(),
        config.request_timeout,
    )?);

    let remote = match &config.gemini_api_key {
        Some(key) => Some(Arc::new(GeminiClient::new(
            key.clone(),
            &config.gemini_model,
            config.request_timeout,
        )?) as Arc<dyn Oracle>),
        None => None,
    };

    Ok(Arc::new(PrivacyRouter::new(local, remote)))
}
