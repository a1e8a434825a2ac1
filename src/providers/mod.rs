//! Capability providers
//!
//! Every action the assistant can take is an `ActionHandler`. Side-effecting
//! handlers split the work into `stage` (build a preview, touch nothing) and
//! `commit` (perform the irreversible step). Read-only handlers implement
//! `execute_direct` instead.

use crate::error::DialogError;
use crate::models::Parameters;
use crate::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

pub mod documents;
pub mod email;
pub mod meeting;
pub mod search;
pub mod sensitive;

pub use documents::{DocumentProvider, PdftotextExtractor, TextExtractor};
pub use email::{ContactBook, EmailDraft, EmailProvider, MailTransport, OutboxTransport};
pub use meeting::{CalendarBackend, InMemoryCalendar, MeetingProvider, MeetingRequest};
pub use search::{SearchBackend, SearchHit, SearchProvider, TavilyClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Preview first, side effect only after explicit confirmation
    Staged,
    /// Read-only, runs immediately
    Direct,
}

/// Handler-specific data carried from `stage` to `commit`.
///
/// Opaque to the orchestrator; each handler encodes its own type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedPayload(Value);

impl StagedPayload {
    pub fn new<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self(serde_json::to_value(value)?))
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.0.clone())?)
    }

    /// SHA-256 of the canonical JSON encoding, hex encoded
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[derive(Debug, Clone)]
pub struct StagedAction {
    pub preview: String,
    pub payload: StagedPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResult {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectOutput {
    pub message: String,
    /// File names, source URLs, or whatever the handler worked over
    pub items: Vec<String>,
    /// Set by handlers that analyzed a document directory
    pub analyzed_directory: Option<String>,
}

impl DirectOutput {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Trait for a single capability provider
#[async_trait::async_trait]
pub trait ActionHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn required_parameters(&self) -> &'static [&'static str];

    fn optional_parameters(&self) -> &'static [&'static str] {
        &[]
    }

    fn mode(&self) -> ExecutionMode;

    async fn stage(&self, _parameters: &Parameters, _raw_message: &str) -> Result<StagedAction> {
        Err(DialogError::unsupported(self.name(), "stage"))
    }

    async fn commit(&self, _payload: &StagedPayload) -> Result<CommitResult> {
        Err(DialogError::unsupported(self.name(), "commit"))
    }

    async fn execute_direct(&self, _parameters: &Parameters) -> Result<DirectOutput> {
        Err(DialogError::unsupported(self.name(), "execute_direct"))
    }
}

/// True for values the classifier uses to mean "not provided"
pub fn is_blank(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null")
}

pub(crate) fn require<'a>(parameters: &'a Parameters, key: &str) -> Result<&'a str> {
    optional(parameters, key).ok_or_else(|| {
        DialogError::InvalidActionInput(format!("Expected '{}' in action parameters", key))
    })
}

pub(crate) fn optional<'a>(parameters: &'a Parameters, key: &str) -> Option<&'a str> {
    parameters
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !is_blank(v))
}
