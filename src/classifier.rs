//! Intent Classifier
//!
//! Asks the oracle to label a message as one of:
//! - Clarification Needed: an action is wanted but details are missing
//! - Action Required (Confirm / Proceed): an action with its parameters
//! - General Inquiry: plain conversation
//!
//! The oracle's answer is untrusted text. Anything that does not parse into a
//! complete record degrades to `General Inquiry / Public` instead of failing.

use crate::models::{Intent, IntentResult, Parameters, Privacy, TurnMessage};
use crate::oracle::Oracle;
use crate::prompts;
use crate::registry::ActionRegistry;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Keys of the classifier record that are not action parameters
const RESERVED_KEYS: &[&str] = &["intent", "privacy", "action", "parameters"];

pub struct IntentClassifier {
    oracle: Arc<dyn Oracle>,
    registry: Arc<ActionRegistry>,
}

impl IntentClassifier {
    pub fn new(oracle: Arc<dyn Oracle>, registry: Arc<ActionRegistry>) -> Self {
        Self { oracle, registry }
    }

    /// Classify `message` in the context of `history`. Never fails.
    pub async fn classify(&self, message: &str, history: &[TurnMessage]) -> IntentResult {
        let prompt =
            prompts::intent_analysis_prompt(message, history, &self.registry.summaries());

        // The history is embedded in the prompt; classification runs on the
        // local model because the message may contain private data.
        let raw = match self.oracle.complete(&prompt, &[], Privacy::Private).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Intent classification request failed, using default intent");
                return IntentResult::default();
            }
        };

        debug!(raw = %raw, "Intent classification raw response");

        match parse_intent_response(&raw) {
            Some(result) => {
                info!(
                    intent = %result.intent,
                    privacy = %result.privacy,
                    action = ?result.action,
                    "Intent classified"
                );
                result
            }
            None => {
                warn!("Malformed intent classification, using default intent");
                IntentResult::default()
            }
        }
    }
}

/// Parse the oracle's classification text.
///
/// Returns `None` when the text holds no JSON object or the object lacks a
/// recognizable `intent` or `privacy`.
pub fn parse_intent_response(raw: &str) -> Option<IntentResult> {
    let json = extract_json_object(raw)?;
    let value: Value = serde_json::from_str(json).ok()?;
    let object = value.as_object()?;

    let intent = object
        .get("intent")
        .and_then(Value::as_str)
        .and_then(Intent::from_label)?;

    let privacy = object
        .get("privacy")
        .and_then(Value::as_str)
        .and_then(Privacy::from_label)?;

    let action = object
        .get("action")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|a| !a.is_empty() && !a.eq_ignore_ascii_case("null") && !a.eq_ignore_ascii_case("none"))
        .map(|a| a.to_ascii_lowercase());

    let mut parameters = Parameters::new();
    if let Some(nested) = object.get("parameters").and_then(Value::as_object) {
        collect_parameters(nested, &mut parameters);
    }
    collect_parameters(object, &mut parameters);

    Some(IntentResult {
        intent,
        privacy,
        action,
        parameters,
    })
}

fn collect_parameters(source: &Map<String, Value>, parameters: &mut Parameters) {
    for (key, value) in source {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }

        let rendered = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(", "),
            Value::Null | Value::Object(_) => continue,
        };

        parameters.insert(key.clone(), rendered);
    }
}

/// Locate the JSON object inside a completion that may be wrapped in a
/// markdown fence or surrounded by prose.
fn extract_json_object(raw: &str) -> Option<&str> {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if cleaned.starts_with('{') && cleaned.ends_with('}') {
        return Some(cleaned);
    }

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    (start < end).then(|| &cleaned[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{recording_registry, ScriptedOracle};

    #[test]
    fn test_parse_send_email() {
        let raw = r#"{
            "intent": "Action Required (Confirm)",
            "privacy": "Private Data",
            "action": "send_email",
            "recipient_name": "John",
            "subject": "Meeting tomorrow",
            "tone": "informal",
            "requires_contact_lookup": true
        }"#;

        let result = parse_intent_response(raw).unwrap();
        assert_eq!(result.intent, Intent::ActionRequiredConfirm);
        assert_eq!(result.privacy, Privacy::Private);
        assert_eq!(result.action.as_deref(), Some("send_email"));
        assert_eq!(result.parameters["recipient_name"], "John");
        assert_eq!(result.parameters["requires_contact_lookup"], "true");
        assert!(!result.parameters.contains_key("intent"));
    }

    #[test]
    fn test_parse_fenced_and_prose_wrapped() {
        let fenced = "```json\n{\"intent\": \"General Inquiry\", \"privacy\": \"Public Data\"}\n```";
        assert_eq!(
            parse_intent_response(fenced).unwrap().intent,
            Intent::GeneralInquiry
        );

        let prose = "Sure! Here you go: {\"intent\": \"Clarification Needed\", \"privacy\": \"Public Data\", \"action\": \"read_pdfs\", \"directory_path\": null} Hope that helps.";
        let result = parse_intent_response(prose).unwrap();
        assert_eq!(result.intent, Intent::ClarificationNeeded);
        assert!(!result.parameters.contains_key("directory_path"));
    }

    #[test]
    fn test_parse_nested_parameters_and_lists() {
        let raw = r#"{"intent": "action_required_confirm", "privacy": "private", "action": "Schedule_Meeting",
            "parameters": {"participants": ["Ana", "Raj"], "time": "Friday 3pm"}}"#;

        let result = parse_intent_response(raw).unwrap();
        assert_eq!(result.action.as_deref(), Some("schedule_meeting"));
        assert_eq!(result.parameters["participants"], "Ana, Raj");
        assert_eq!(result.parameters["time"], "Friday 3pm");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let cases = vec![
            "",
            "I think the user wants an email",
            "{\"intent\": \"General Inquiry\"",
            "{\"privacy\": \"Public Data\"}",
            "{\"intent\": \"Launch Rockets\", \"privacy\": \"Public Data\"}",
            "[\"intent\", \"privacy\"]",
        ];

        for raw in cases {
            assert!(parse_intent_response(raw).is_none(), "{:?}", raw);
        }
    }

    #[test]
    fn test_null_action_is_none() {
        let raw = r#"{"intent": "General Inquiry", "privacy": "Public Data", "action": "null"}"#;
        assert!(parse_intent_response(raw).unwrap().action.is_none());
    }

    #[tokio::test]
    async fn test_classify_fails_soft_on_garbage() {
        let oracle = Arc::new(ScriptedOracle::new());
        oracle.push_classification("<html>502 Bad Gateway</html>");
        let (registry, _) = recording_registry();
        let classifier = IntentClassifier::new(oracle, registry);

        let result = classifier.classify("hello", &[]).await;
        assert_eq!(result, IntentResult::default());
    }

    #[tokio::test]
    async fn test_classify_fails_soft_on_oracle_error() {
        let oracle = Arc::new(ScriptedOracle::new());
        oracle.fail_classifications();
        let (registry, _) = recording_registry();
        let classifier = IntentClassifier::new(oracle, registry);

        let result = classifier.classify("hello", &[]).await;
        assert_eq!(result.intent, Intent::GeneralInquiry);
        assert_eq!(result.privacy, Privacy::Public);
    }

    #[tokio::test]
    async fn test_classify_sends_history_in_prompt() {
        let oracle = Arc::new(ScriptedOracle::new());
        oracle.push_classification(
            r#"{"intent": "General Inquiry", "privacy": "Public Data"}"#,
        );
        let (registry, _) = recording_registry();
        let classifier = IntentClassifier::new(oracle.clone(), registry);

        let history = vec![TurnMessage::user("Read PDFs"), TurnMessage::assistant("Which folder?")];
        classifier.classify("/data/papers", &history).await;

        let prompts = oracle.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Assistant: Which folder?"));
        assert!(prompts[0].contains("\"read_pdfs\""));
    }
}
