//! Response formatting
//!
//! Turns outcomes, previews and listings into the text shown to the user.
//! Nothing in here talks to the oracle or a provider.

use crate::models::{Outcome, OutcomeStatus};
use crate::providers::sensitive::SensitiveKind;
use crate::providers::{DirectOutput, EmailDraft, MeetingRequest};
use crate::session::AnalyzedDocuments;

pub const EMAIL_CONFIRMATION_QUESTION: &str = "Please confirm if you want to send this email.";
pub const MEETING_CONFIRMATION_QUESTION: &str =
    "Please confirm if you want to schedule this meeting.";
pub const GENERIC_CONFIRMATION_QUESTION: &str = "Please confirm if you want to proceed.";

pub const GENERIC_FAILURE: &str =
    "Sorry, something went wrong while processing your request. Please try again.";
pub const DEADLINE_EXCEEDED: &str =
    "Sorry, that took too long to finish. Nothing was changed, please try again.";
pub const EMPTY_ANSWER: &str = "I'm not sure how to answer that. Could you rephrase?";

pub fn confirmation_question(action: &str) -> &'static str {
    match action {
        "send_email" => EMAIL_CONFIRMATION_QUESTION,
        "schedule_meeting" => MEETING_CONFIRMATION_QUESTION,
        _ => GENERIC_CONFIRMATION_QUESTION,
    }
}

/// Drafted preview followed by the action's confirmation question
pub fn confirmation_request(action: &str, outcome: &Outcome) -> String {
    format!(
        "{}\n\n{}",
        outcome.user_message.trim_end(),
        confirmation_question(action)
    )
}

pub fn email_preview(draft: &EmailDraft, warning: Option<SensitiveKind>) -> String {
    let mut preview = format!("To: {}\n", draft.to);
    if let Some(cc) = &draft.cc {
        preview.push_str(&format!("Cc: {}\n", cc));
    }
    preview.push_str(&format!("Subject: {}\n\n{}", draft.subject, draft.body.trim()));

    if let Some(kind) = warning {
        preview.push_str(&format!(
            "\n\nWarning: this email appears to contain {}.",
            kind.describe()
        ));
    }
    preview
}

pub fn meeting_preview(request: &MeetingRequest) -> String {
    let mut preview = format!(
        "Meeting with {}\nWhen: {}",
        request.participants.join(", "),
        request.time
    );
    if let Some(topic) = &request.topic {
        preview.push_str(&format!("\nTopic: {}", topic));
    }
    preview
}

pub fn outcome_text(outcome: &Outcome) -> String {
    match outcome.status {
        OutcomeStatus::Executed if outcome.side_effects.committed => {
            format!("Action completed: {}", outcome.user_message)
        }
        _ => outcome.user_message.clone(),
    }
}

/// Render a read-only action's output, listing what it worked over.
pub fn direct_result(action: &str, output: &DirectOutput) -> String {
    if output.items.is_empty() {
        return output.message.clone();
    }

    let items = bullet_list(&output.items);
    match action {
        "read_pdfs" => format!(
            "Analyzed {} file(s):\n{}\n\n{}",
            output.items.len(),
            items,
            output.message
        ),
        "internet_search" => format!("{}\n\nSources:\n{}", output.message, items),
        _ => format!("{}\n\n{}", output.message, items),
    }
}

pub fn document_listing(documents: &AnalyzedDocuments) -> String {
    format!(
        "The available papers in {} are:\n{}",
        documents.directory,
        bullet_list(&documents.files)
    )
}

pub fn answer(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        EMPTY_ANSWER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Used when the oracle cannot phrase the clarification question.
pub fn fallback_clarification(action: Option<&str>, missing: &[String]) -> String {
    match (action, missing.is_empty()) {
        (Some(action), false) => format!(
            "To {} I still need: {}. Could you provide {}?",
            action.replace('_', " "),
            missing.join(", "),
            if missing.len() == 1 { "it" } else { "them" }
        ),
        (Some(action), true) => format!(
            "Could you tell me a bit more about how you'd like me to {}?",
            action.replace('_', " ")
        ),
        (None, _) => "Could you tell me a bit more about what you'd like me to do?".to_string(),
    }
}

pub fn unsupported_action(name: &str) -> String {
    format!(
        "I'm sorry, I can't help with \"{}\" yet. I can send emails, read PDFs, search the internet and schedule meetings.",
        name
    )
}

/// The deadline hit while a confirmed action was committing, so it may have gone through.
pub fn commit_outcome_unknown(action: &str) -> String {
    let what = match action {
        "send_email" => "the email was sent",
        "schedule_meeting" => "the meeting was scheduled",
        _ => "that action completed",
    };
    format!(
        "Sorry, that took too long and I couldn't confirm whether {}. Please check before trying again.",
        what
    )
}

pub fn cancellation(action: &str) -> String {
    match action {
        "send_email" => "Okay, I won't send that email.".to_string(),
        "schedule_meeting" => "Okay, I won't schedule that meeting.".to_string(),
        _ => "Okay, I've cancelled that.".to_string(),
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SideEffects;

    #[test]
    fn test_email_confirmation_text_is_exact() {
        let outcome = Outcome::drafted("To: john@example.com\n");
        let text = confirmation_request("send_email", &outcome);
        assert!(text.ends_with("\n\nPlease confirm if you want to send this email."));
        assert_eq!(
            confirmation_question("schedule_meeting"),
            MEETING_CONFIRMATION_QUESTION
        );
    }

    #[test]
    fn test_outcome_text() {
        let committed = Outcome::executed(
            "Email sent.",
            SideEffects {
                committed: true,
                detail: None,
            },
        );
        assert_eq!(outcome_text(&committed), "Action completed: Email sent.");

        let read_only = Outcome::executed("Summary", SideEffects::default());
        assert_eq!(outcome_text(&read_only), "Summary");
        assert_eq!(outcome_text(&Outcome::failed(GENERIC_FAILURE)), GENERIC_FAILURE);
    }

    #[test]
    fn test_direct_result_lists_items() {
        let output = DirectOutput {
            message: "Both discuss caching.".to_string(),
            items: vec!["a.pdf".to_string(), "b.pdf".to_string()],
            analyzed_directory: Some("/p".to_string()),
        };
        assert_eq!(
            direct_result("read_pdfs", &output),
            "Analyzed 2 file(s):\n- a.pdf\n- b.pdf\n\nBoth discuss caching."
        );

        let bare = DirectOutput::message("No supported PDF files found in the specified directory.");
        assert_eq!(direct_result("read_pdfs", &bare), bare.message);
    }

    #[test]
    fn test_commit_outcome_unknown_never_claims_nothing_changed() {
        let text = commit_outcome_unknown("send_email");
        assert!(text.contains("couldn't confirm whether the email was sent"));
        assert!(!text.contains("Nothing was changed"));
        assert!(commit_outcome_unknown("other").contains("that action completed"));
    }

    #[test]
    fn test_fallback_clarification() {
        let text = fallback_clarification(Some("read_pdfs"), &["directory_path".to_string()]);
        assert_eq!(
            text,
            "To read pdfs I still need: directory_path. Could you provide it?"
        );
        assert!(fallback_clarification(None, &[]).contains("what you'd like"));
    }

    #[test]
    fn test_email_preview_warning() {
        let draft = EmailDraft {
            recipient_name: "John".to_string(),
            to: "john@example.com".to_string(),
            cc: Some("boss@example.com".to_string()),
            subject: "Hi".to_string(),
            body: "Hello\n".to_string(),
        };
        let preview = email_preview(&draft, Some(SensitiveKind::Password));
        assert!(preview.starts_with("To: john@example.com\nCc: boss@example.com\nSubject: Hi\n\nHello"));
        assert!(preview.ends_with("Warning: this email appears to contain a password."));
        assert!(!email_preview(&draft, None).contains("Warning"));
    }
}
