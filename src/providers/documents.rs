//! PDF analysis provider (direct, read-only)

use super::{optional, require, ActionHandler, DirectOutput, ExecutionMode};
use crate::error::DialogError;
use crate::models::{Parameters, Privacy};
use crate::oracle::Oracle;
use crate::prompts::{self, DEFAULT_DOCUMENT_QUERY};
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{info, warn};

pub const INVALID_DIRECTORY: &str =
    "The specified directory path is invalid or does not exist. Please check and try again.";
pub const NO_PDFS_FOUND: &str = "No supported PDF files found in the specified directory.";

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String>;
}

/// Runs poppler's `pdftotext -layout <file> -`
pub struct PdftotextExtractor {
    binary: String,
}

impl PdftotextExtractor {
    pub fn new(binary: String) -> Self {
        Self { binary }
    }
}

#[async_trait]
impl TextExtractor for PdftotextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("-layout")
            .arg(path)
            .arg("-")
            .output()
            .await?;

        if !output.status.success() {
            return Err(DialogError::ProviderError(format!(
                "{} failed on {}: {}",
                self.binary,
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// `*.pdf` files directly under `dir`, sorted by name
pub async fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

pub struct DocumentProvider {
    oracle: Arc<dyn Oracle>,
    extractor: Arc<dyn TextExtractor>,
    max_context_chars: usize,
}

impl DocumentProvider {
    pub fn new(oracle: Arc<dyn Oracle>, extractor: Arc<dyn TextExtractor>, max_context_chars: usize) -> Self {
        Self {
            oracle,
            extractor,
            max_context_chars,
        }
    }

    /// Concatenate extracted text until the character budget runs out.
    async fn build_context(&self, files: &[PathBuf], names: &[String]) -> Result<String> {
        let mut context = String::new();
        let mut remaining = self.max_context_chars;
        let mut extracted = 0;

        for (path, name) in files.iter().zip(names) {
            if remaining == 0 {
                info!(file = %name, "Context budget exhausted, skipping");
                continue;
            }

            let text = match self.extractor.extract(path).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(file = %name, error = %e, "Text extraction failed");
                    continue;
                }
            };
            extracted += 1;

            let section = format!("=== {} ===\n{}\n", name, text.trim());
            let taken: String = section.chars().take(remaining).collect();
            remaining -= taken.chars().count();
            context.push_str(&taken);
        }

        if extracted == 0 {
            return Err(DialogError::ProviderError(
                "Could not extract text from any PDF".to_string(),
            ));
        }

        Ok(context)
    }
}

#[async_trait]
impl ActionHandler for DocumentProvider {
    fn name(&self) -> &'static str {
        "read_pdfs"
    }

    fn description(&self) -> &'static str {
        "Read the PDF files in a directory and answer a question about them"
    }

    fn required_parameters(&self) -> &'static [&'static str] {
        &["directory_path"]
    }

    fn optional_parameters(&self) -> &'static [&'static str] {
        &["query"]
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Direct
    }

    async fn execute_direct(&self, parameters: &Parameters) -> Result<DirectOutput> {
        let directory = require(parameters, "directory_path")?;
        let query = optional(parameters, "query").unwrap_or(DEFAULT_DOCUMENT_QUERY);

        let dir = Path::new(directory);
        match tokio::fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(DialogError::Rejected(INVALID_DIRECTORY.to_string())),
        }

        let files = list_pdfs(dir).await?;
        if files.is_empty() {
            return Ok(DirectOutput::message(NO_PDFS_FOUND));
        }

        let names: Vec<String> = files
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();

        info!(directory = %directory, files = names.len(), "Analyzing PDFs");

        let context = self.build_context(&files, &names).await?;
        let prompt = prompts::document_query_prompt(query, &names, &context);
        let answer = self.oracle.complete(&prompt, &[], Privacy::Private).await?;

        Ok(DirectOutput {
            message: answer.trim().to_string(),
            items: names,
            analyzed_directory: Some(directory.to_string()),
        })
    }
}
