//! Email provider
//!
//! Staged: `stage` resolves the recipient, drafts the body and returns a
//! preview; `commit` hands the stored draft to the mail transport.

use super::sensitive;
use super::{optional, require, ActionHandler, CommitResult, ExecutionMode, StagedAction, StagedPayload};
use crate::error::DialogError;
use crate::formatter;
use crate::models::{Parameters, Privacy};
use crate::oracle::Oracle;
use crate::prompts;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

lazy_static! {
    static ref EMAIL_ADDRESS: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern");
}

pub fn is_email_address(value: &str) -> bool {
    EMAIL_ADDRESS.is_match(value.trim())
}

/// Header values must fit on a single line with no control characters.
fn check_header(field: &str, value: &str) -> Result<()> {
    if value.chars().any(|c| c.is_control()) {
        return Err(DialogError::Rejected(format!(
            "The email {} contains a line break or control character. Please rephrase it on a single line.",
            field
        )));
    }
    Ok(())
}

/// Name → address lookup loaded from a JSON object file
#[derive(Debug, Clone, Default)]
pub struct ContactBook {
    contacts: HashMap<String, String>,
}

impl ContactBook {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self {
            contacts: entries
                .into_iter()
                .map(|(name, address)| (name.trim().to_lowercase(), address.trim().to_string()))
                .collect(),
        }
    }

    /// Load `{"name": "address", ...}`. A missing file gives an empty book.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => {
                let entries: HashMap<String, String> = serde_json::from_str(&raw)?;
                info!(path = %path.display(), contacts = entries.len(), "Contacts loaded");
                Ok(Self::new(entries))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Contacts file not found, starting with no contacts");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a recipient. A literal address passes through unchanged.
    pub fn find_email(&self, name_or_address: &str) -> Option<String> {
        let needle = name_or_address.trim();
        if is_email_address(needle) {
            return Some(needle.to_string());
        }
        self.contacts.get(&needle.to_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub recipient_name: String,
    pub to: String,
    pub cc: Option<String>,
    pub subject: String,
    pub body: String,
}

impl EmailDraft {
    fn check_headers(&self) -> Result<()> {
        check_header("recipient", &self.to)?;
        if let Some(cc) = &self.cc {
            check_header("cc address", cc)?;
        }
        check_header("subject", &self.subject)
    }
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, from: &str, draft: &EmailDraft) -> Result<()>;
}

/// Writes each message as an RFC 5322 `.eml` file under a directory.
pub struct OutboxTransport {
    dir: PathBuf,
}

impl OutboxTransport {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn render(from: &str, draft: &EmailDraft, message_id: &Uuid) -> Result<String> {
        check_header("sender", from)?;
        draft.check_headers()?;

        let mut message = String::new();
        message.push_str(&format!("From: {}\r\n", from));
        message.push_str(&format!("To: {}\r\n", draft.to));
        if let Some(cc) = &draft.cc {
            message.push_str(&format!("Cc: {}\r\n", cc));
        }
        message.push_str(&format!("Subject: {}\r\n", draft.subject));
        message.push_str(&format!("Date: {}\r\n", Utc::now().to_rfc2822()));
        message.push_str(&format!("Message-ID: <{}@intellichat>\r\n", message_id));
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
        message.push_str(&draft.body.replace('\n', "\r\n"));
        message.push_str("\r\n");
        Ok(message)
    }
}

#[async_trait]
impl MailTransport for OutboxTransport {
    async fn send(&self, from: &str, draft: &EmailDraft) -> Result<()> {
        let message_id = Uuid::new_v4();
        let rendered = Self::render(from, draft, &message_id)?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = format!("{}-{}.eml", Utc::now().format("%Y%m%dT%H%M%S"), message_id);
        let path = self.dir.join(file_name);

        tokio::fs::write(&path, rendered).await?;
        info!(to = %draft.to, path = %path.display(), "Email written to outbox");
        Ok(())
    }
}

pub struct EmailProvider {
    oracle: Arc<dyn Oracle>,
    contacts: ContactBook,
    transport: Arc<dyn MailTransport>,
    from_address: String,
    cc_address: Option<String>,
}

impl EmailProvider {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        contacts: ContactBook,
        transport: Arc<dyn MailTransport>,
        from_address: String,
        cc_address: Option<String>,
    ) -> Self {
        Self {
            oracle,
            contacts,
            transport,
            from_address,
            cc_address,
        }
    }

    async fn draft_body(&self, recipient: &str, subject: &str, raw_message: &str) -> Result<String> {
        let prompt = prompts::email_drafting_prompt(recipient, subject, raw_message);
        let body = self
            .oracle
            .complete(&prompt, &[], Privacy::Private)
            .await?
            .trim()
            .to_string();

        if body.is_empty() {
            return Err(DialogError::LlmError("Email draft came back empty".to_string()));
        }
        Ok(body)
    }
}

#[async_trait]
impl ActionHandler for EmailProvider {
    fn name(&self) -> &'static str {
        "send_email"
    }

    fn description(&self) -> &'static str {
        "Draft an email to a contact and send it after the user confirms"
    }

    fn required_parameters(&self) -> &'static [&'static str] {
        &["recipient_name", "subject"]
    }

    fn optional_parameters(&self) -> &'static [&'static str] {
        &["body", "tone"]
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Staged
    }

    async fn stage(&self, parameters: &Parameters, raw_message: &str) -> Result<StagedAction> {
        let recipient = require(parameters, "recipient_name")?;
        let subject = require(parameters, "subject")?;

        let to = self.contacts.find_email(recipient).ok_or_else(|| {
            DialogError::Rejected(format!(
                "I couldn't find an email address for {}. Add them to your contacts or give me their email address.",
                recipient
            ))
        })?;

        let body = match optional(parameters, "body") {
            Some(body) => body.to_string(),
            None => self.draft_body(recipient, subject, raw_message).await?,
        };

        let warning = sensitive::scan(&body);
        if let Some(kind) = warning {
            warn!(kind = ?kind, "Email draft contains sensitive data");
        }

        let draft = EmailDraft {
            recipient_name: recipient.to_string(),
            to,
            cc: self.cc_address.clone(),
            subject: subject.to_string(),
            body,
        };
        draft.check_headers()?;

        Ok(StagedAction {
            preview: formatter::email_preview(&draft, warning),
            payload: StagedPayload::new(&draft)?,
        })
    }

    async fn commit(&self, payload: &StagedPayload) -> Result<CommitResult> {
        let draft: EmailDraft = payload.decode()?;
        self.transport.send(&self.from_address, &draft).await?;

        Ok(CommitResult {
            success: true,
            message: format!("Email sent successfully to {}.", draft.to),
        })
    }
}
