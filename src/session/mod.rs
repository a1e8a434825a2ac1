//! Conversation session and dialog state
//!
//! A session owns its transcript, the dialog state machine position and
//! per-action task counters. Pending-action data lives inside the
//! non-idle state variants, so an idle session can never carry a stale
//! pending action.

mod history;
mod store;

pub use history::TurnHistory;
pub use store::SessionStore;

use crate::models::{Parameters, TurnMessage, TurnReply};
use crate::providers::StagedPayload;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    AwaitingClarification,
    AwaitingConfirmation,
}

/// An action the dialog is waiting on
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAction {
    pub action: Option<String>,
    pub parameters: Parameters,
    /// Required fields still missing when clarification was requested
    pub missing: Vec<String>,
    /// Present only while awaiting confirmation
    pub staged: Option<StagedPayload>,
}

impl PendingAction {
    pub fn partial(action: Option<String>, parameters: Parameters, missing: Vec<String>) -> Self {
        Self {
            action,
            parameters,
            missing,
            staged: None,
        }
    }

    pub fn staged(action: impl Into<String>, parameters: Parameters, payload: StagedPayload) -> Self {
        Self {
            action: Some(action.into()),
            parameters,
            missing: Vec::new(),
            staged: Some(payload),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DialogState {
    #[default]
    Idle,
    AwaitingClarification(PendingAction),
    AwaitingConfirmation(PendingAction),
}

impl DialogState {
    pub fn status(&self) -> SessionStatus {
        match self {
            DialogState::Idle => SessionStatus::Idle,
            DialogState::AwaitingClarification(_) => SessionStatus::AwaitingClarification,
            DialogState::AwaitingConfirmation(_) => SessionStatus::AwaitingConfirmation,
        }
    }

    pub fn pending_action(&self) -> Option<&PendingAction> {
        match self {
            DialogState::Idle => None,
            DialogState::AwaitingClarification(p) | DialogState::AwaitingConfirmation(p) => Some(p),
        }
    }
}

/// Last directory analyzed by the document reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzedDocuments {
    pub directory: String,
    pub files: Vec<String>,
}

/// Everything a turn decided, applied to the session in one step.
#[derive(Debug, Clone)]
pub struct Transition {
    pub next: DialogState,
    pub response_text: String,
    pub completed_action: Option<String>,
    pub documents: Option<AnalyzedDocuments>,
}

impl Transition {
    pub fn to(next: DialogState, response_text: impl Into<String>) -> Self {
        Self {
            next,
            response_text: response_text.into(),
            completed_action: None,
            documents: None,
        }
    }

    pub fn idle(response_text: impl Into<String>) -> Self {
        Self::to(DialogState::Idle, response_text)
    }

    pub fn completed(mut self, action: impl Into<String>) -> Self {
        self.completed_action = Some(action.into());
        self
    }

    pub fn with_documents(mut self, documents: Option<AnalyzedDocuments>) -> Self {
        self.documents = documents;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    history: TurnHistory,
    state: DialogState,
    task_counters: BTreeMap<String, u64>,
    documents: Option<AnalyzedDocuments>,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
            history: TurnHistory::new(),
            state: DialogState::Idle,
            task_counters: BTreeMap::new(),
            documents: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn pending_action(&self) -> Option<&PendingAction> {
        self.state.pending_action()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn history(&self) -> &TurnHistory {
        &self.history
    }

    pub fn task_count(&self, action: &str) -> u64 {
        self.task_counters.get(action).copied().unwrap_or(0)
    }

    pub fn task_counters(&self) -> &BTreeMap<String, u64> {
        &self.task_counters
    }

    pub fn analyzed_documents(&self) -> Option<&AnalyzedDocuments> {
        self.documents.as_ref()
    }

    /// Record the turn and move to the next state.
    pub(crate) fn apply(&mut self, user_message: &str, transition: Transition) -> TurnReply {
        let Transition {
            next,
            response_text,
            completed_action,
            documents,
        } = transition;

        self.history.push(TurnMessage::user(user_message));
        self.history.push(TurnMessage::assistant(response_text.clone()));

        if let Some(action) = completed_action {
            *self.task_counters.entry(action).or_insert(0) += 1;
        }
        if documents.is_some() {
            self.documents = documents;
        }

        let awaiting_confirmation = matches!(next, DialogState::AwaitingConfirmation(_));
        self.state = next;
        self.updated_at = Utc::now();

        TurnReply {
            response_text,
            awaiting_confirmation,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            status: self.status(),
            pending_action: self.pending_action().and_then(|p| p.action.clone()),
            message_count: self.history.len(),
            task_counters: self.task_counters.clone(),
            analyzed_documents: self.documents.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Read-only view served by the HTTP API
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub pending_action: Option<String>,
    pub message_count: usize,
    pub task_counters: BTreeMap<String, u64>,
    pub analyzed_documents: Option<AnalyzedDocuments>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new(Uuid::new_v4());
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.pending_action().is_none());
        assert!(session.history().is_empty());
        assert_eq!(session.task_count("send_email"), 0);
    }

    #[test]
    fn test_apply_records_turn_and_counts() {
        let mut session = Session::new(Uuid::new_v4());

        let pending = PendingAction::partial(
            Some("read_pdfs".to_string()),
            Parameters::new(),
            vec!["directory_path".to_string()],
        );
        let reply = session.apply(
            "Read PDFs",
            Transition::to(DialogState::AwaitingClarification(pending), "Which directory?"),
        );
        assert!(!reply.awaiting_confirmation);
        assert_eq!(session.status(), SessionStatus::AwaitingClarification);
        assert_eq!(
            session.pending_action().unwrap().missing,
            vec!["directory_path"]
        );

        let reply = session.apply(
            "/data",
            Transition::idle("Done").completed("read_pdfs").with_documents(Some(
                AnalyzedDocuments {
                    directory: "/data".to_string(),
                    files: vec!["a.pdf".to_string()],
                },
            )),
        );
        assert_eq!(reply.response_text, "Done");
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.pending_action().is_none());
        assert_eq!(session.task_count("read_pdfs"), 1);
        assert_eq!(session.history().len(), 4);
        assert_eq!(session.analyzed_documents().unwrap().files, vec!["a.pdf"]);

        let summary = session.summary();
        assert_eq!(summary.message_count, 4);
        assert_eq!(summary.task_counters["read_pdfs"], 1);
    }

    #[test]
    fn test_confirmation_state_flags_reply() {
        let mut session = Session::new(Uuid::new_v4());
        let payload = StagedPayload::new(&"draft").unwrap();
        let reply = session.apply(
            "email John",
            Transition::to(
                DialogState::AwaitingConfirmation(PendingAction::staged(
                    "send_email",
                    Parameters::new(),
                    payload,
                )),
                "Please confirm",
            ),
        );

        assert!(reply.awaiting_confirmation);
        assert_eq!(session.summary().pending_action.as_deref(), Some("send_email"));
    }
}
