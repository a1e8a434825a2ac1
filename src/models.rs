//! Core data models for the dialog orchestrator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Action parameters as extracted by the classifier.
///
/// Ordered so prompts and logs render deterministically.
pub type Parameters = BTreeMap<String, String>;

//
// ================= Intent =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ClarificationNeeded,
    ActionRequiredConfirm,
    ActionRequiredProceed,
    GeneralInquiry,
}

impl Intent {
    /// Parse the label used in the classification prompt.
    ///
    /// Matching ignores case, punctuation and spacing, so
    /// `"Action Required (Confirm)"` and `"action_required_confirm"` agree.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "clarificationneeded" => Some(Intent::ClarificationNeeded),
            "actionrequiredconfirm" => Some(Intent::ActionRequiredConfirm),
            "actionrequiredproceed" => Some(Intent::ActionRequiredProceed),
            "generalinquiry" => Some(Intent::GeneralInquiry),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Private,
    Public,
}

impl Privacy {
    /// `None` for labels that are neither private nor public, so the caller can fall back.
    pub fn from_label(label: &str) -> Option<Self> {
        let lowered = label.trim().to_ascii_lowercase();
        if lowered.starts_with("private") {
            Some(Privacy::Private)
        } else if lowered.starts_with("public") {
            Some(Privacy::Public)
        } else {
            None
        }
    }
}

/// Structured classifier output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntentResult {
    pub intent: Intent,
    pub privacy: Privacy,
    pub action: Option<String>,
    #[serde(default)]
    pub parameters: Parameters,
}

impl Default for IntentResult {
    fn default() -> Self {
        Self {
            intent: Intent::GeneralInquiry,
            privacy: Privacy::Public,
            action: None,
            parameters: Parameters::new(),
        }
    }
}

//
// ================= Conversation =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

/// A single role-tagged message in a session's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl TurnMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

//
// ================= Outcome =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Drafted,
    Executed,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SideEffects {
    /// True once an irreversible effect (email sent, meeting booked) happened.
    pub committed: bool,
    pub detail: Option<String>,
}

/// Result of drafting or executing an action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub status: OutcomeStatus,
    pub user_message: String,
    pub side_effects: SideEffects,
}

impl Outcome {
    pub fn drafted(user_message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Drafted,
            user_message: user_message.into(),
            side_effects: SideEffects::default(),
        }
    }

    pub fn executed(user_message: impl Into<String>, side_effects: SideEffects) -> Self {
        Self {
            status: OutcomeStatus::Executed,
            user_message: user_message.into(),
            side_effects,
        }
    }

    pub fn failed(user_message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            user_message: user_message.into(),
            side_effects: SideEffects::default(),
        }
    }
}

//
// ================= Turn I/O =================
//

/// What a single call to the orchestrator returns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnReply {
    pub response_text: String,
    pub awaiting_confirmation: bool,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intent::ClarificationNeeded => "Clarification Needed",
            Intent::ActionRequiredConfirm => "Action Required (Confirm)",
            Intent::ActionRequiredProceed => "Action Required (Proceed)",
            Intent::GeneralInquiry => "General Inquiry",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Privacy::Private => "Private Data",
            Privacy::Public => "Public Data",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_labels() {
        let cases = vec![
            ("Clarification Needed", Intent::ClarificationNeeded),
            ("Action Required (Confirm)", Intent::ActionRequiredConfirm),
            ("action required (proceed)", Intent::ActionRequiredProceed),
            ("general_inquiry", Intent::GeneralInquiry),
        ];

        for (label, expected) in cases {
            assert_eq!(Intent::from_label(label), Some(expected), "{}", label);
        }

        assert_eq!(Intent::from_label("do something"), None);
    }

    #[test]
    fn test_display_round_trips_through_label() {
        for intent in [
            Intent::ClarificationNeeded,
            Intent::ActionRequiredConfirm,
            Intent::ActionRequiredProceed,
            Intent::GeneralInquiry,
        ] {
            assert_eq!(Intent::from_label(&intent.to_string()), Some(intent));
        }
    }

    #[test]
    fn test_privacy_labels() {
        assert_eq!(Privacy::from_label("Private Data"), Some(Privacy::Private));
        assert_eq!(Privacy::from_label(" public data"), Some(Privacy::Public));
        assert_eq!(Privacy::from_label("secret"), None);
    }

    #[test]
    fn test_default_intent_result() {
        let result = IntentResult::default();
        assert_eq!(result.intent, Intent::GeneralInquiry);
        assert_eq!(result.privacy, Privacy::Public);
        assert!(result.action.is_none());
        assert!(result.parameters.is_empty());
    }
}
