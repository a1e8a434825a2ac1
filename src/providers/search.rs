//! Internet search provider backed by Tavily

use super::sensitive;
use super::{require, ActionHandler, DirectOutput, ExecutionMode};
use crate::error::DialogError;
use crate::models::{Parameters, Privacy};
use crate::oracle::Oracle;
use crate::prompts;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub const SENSITIVE_QUERY_REFUSAL: &str =
    "I'm sorry, but I can't perform this search as it contains sensitive data.";
pub const NO_RESULTS: &str = "I couldn't find any results for that search.";

const TAVILY_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

pub struct TavilyClient {
    client: Client,
    api_key: Option<String>,
    max_results: usize,
}

impl TavilyClient {
    pub fn new(api_key: Option<String>, max_results: usize, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            max_results,
        })
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'static str,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[async_trait]
impl SearchBackend for TavilyClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            DialogError::ConfigError("TAVILY_API_KEY not configured".to_string())
        })?;

        let request = TavilyRequest {
            api_key,
            query,
            max_results: self.max_results,
            search_depth: "basic",
        };

        let response = self.client.post(TAVILY_URL).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "Tavily error response: {}", body);
            return Err(DialogError::ProviderError(format!("Tavily returned {}", status)));
        }

        let parsed: TavilyResponse = response.json().await?;
        Ok(parsed.results)
    }
}

pub struct SearchProvider {
    oracle: Arc<dyn Oracle>,
    backend: Arc<dyn SearchBackend>,
}

impl SearchProvider {
    pub fn new(oracle: Arc<dyn Oracle>, backend: Arc<dyn SearchBackend>) -> Self {
        Self { oracle, backend }
    }
}

fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("[{}] {}\n{}\n{}", i + 1, hit.title, hit.url, hit.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl ActionHandler for SearchProvider {
    fn name(&self) -> &'static str {
        "internet_search"
    }

    fn description(&self) -> &'static str {
        "Search the internet and summarize what the results say"
    }

    fn required_parameters(&self) -> &'static [&'static str] {
        &["query"]
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Direct
    }

    async fn execute_direct(&self, parameters: &Parameters) -> Result<DirectOutput> {
        let query = require(parameters, "query")?;

        if let Some(kind) = sensitive::scan(query) {
            warn!(kind = ?kind, "Refusing search containing sensitive data");
            return Ok(DirectOutput::message(SENSITIVE_QUERY_REFUSAL));
        }

        let hits = self.backend.search(query).await?;
        info!(results = hits.len(), "Search completed");

        if hits.is_empty() {
            return Ok(DirectOutput::message(NO_RESULTS));
        }

        let prompt = prompts::internet_search_prompt(query, &format_hits(&hits));
        let answer = self.oracle.complete(&prompt, &[], Privacy::Public).await?;

        Ok(DirectOutput {
            message: answer.trim().to_string(),
            items: hits.into_iter().map(|h| h.url).collect(),
            analyzed_directory: None,
        })
    }
}
