//! Prompt builders
//!
//! Every prompt sent to the oracle is assembled here so the wording stays in
//! one place.

use crate::models::{MessageRole, TurnMessage};

/// Appears only in the classification prompt.
pub const INTENT_PROMPT_MARKER: &str = "You classify user messages into intents";

pub const DEFAULT_DOCUMENT_QUERY: &str = "Summarize the documents.";

/// Catalog line for one action: `name`, what it does, its fields.
pub struct ActionSummary<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub required: &'a [&'a str],
    pub optional: &'a [&'a str],
}

pub fn intent_analysis_prompt(
    message: &str,
    history: &[TurnMessage],
    actions: &[ActionSummary<'_>],
) -> String {
    let mut catalog = String::new();
    for action in actions {
        catalog.push_str(&format!(
            "- \"{}\": {}\n  required fields: {}\n",
            action.name,
            action.description,
            action.required.join(", ")
        ));
        if !action.optional.is_empty() {
            catalog.push_str(&format!(
                "  optional fields: {}\n",
                action.optional.join(", ")
            ));
        }
    }

    let transcript = if history.is_empty() {
        "(no previous messages)".to_string()
    } else {
        format_transcript(history)
    };

    format!(
        r#"{marker} and extract action parameters.

Intents:
1. "Clarification Needed": the user wants an action but a required field is missing or unclear.
2. "Action Required (Confirm)": all required fields are present and the action should be prepared and confirmed before it is finalized (e.g. sending an email).
3. "Action Required (Proceed)": all required fields are present and the action can run directly (e.g. reading PDFs, searching).
4. "General Inquiry": a question or conversation that needs no action.

Privacy: tag the message "Private Data" if it contains personal or confidential content, otherwise "Public Data".

Available actions:
{catalog}
If the latest message answers a question from the conversation below, combine both to fill the fields.
If any required field is missing or empty, set "intent" to "Clarification Needed" and still name the action.

Examples:
Message: "Send an email to John about the meeting tomorrow."
{{"intent": "Action Required (Confirm)", "privacy": "Private Data", "action": "send_email", "recipient_name": "John", "subject": "Meeting tomorrow", "tone": "informal"}}

Message: "Read PDFs"
{{"intent": "Clarification Needed", "privacy": "Public Data", "action": "read_pdfs", "directory_path": null, "query": null}}

Message: "Read PDFs at /home/me/papers and summarize all of them."
{{"intent": "Action Required (Proceed)", "privacy": "Public Data", "action": "read_pdfs", "directory_path": "/home/me/papers", "query": "summarize all files"}}

Conversation so far:
{transcript}

Respond ONLY with a single JSON object, no explanations or comments:
{{"intent": "...", "privacy": "Private Data" or "Public Data", "action": "..." or null, "<field>": "<value>", ...}}

Message: "{message}""#,
        marker = INTENT_PROMPT_MARKER,
        catalog = catalog,
        transcript = transcript,
        message = message,
    )
}

pub fn clarification_prompt(action: Option<&str>, missing: &[String]) -> String {
    let action_text = match action {
        Some("send_email") => "sending an email",
        Some("read_pdfs") => "reading and analyzing PDF files in a specified directory",
        Some("schedule_meeting") => "scheduling a meeting",
        Some("internet_search") => "performing an internet search",
        _ => "working out what the user wants done",
    };

    let missing_details = if missing.is_empty() {
        "the specific task the user wants performed".to_string()
    } else {
        missing.join(", ")
    };

    format!(
        r#"You are assisting with {}. Based on the conversation so far, some details are missing:
- Required details: {}

Write a short, polite clarification request asking the user for exactly these details.
Reply with the request only."#,
        action_text, missing_details
    )
}

pub fn assistant_query_prompt(user_message: &str) -> String {
    format!(
        "You are IntelliChat, an assistant capable of:\n\
         - Reading and analyzing PDF documents\n\
         - Drafting and sending emails on behalf of the user\n\
         - Scheduling meetings\n\
         - Searching the internet for information\n\n\
         Answer the user's message. If one of these features would help, offer it \
         and say which details you would need.\n\n\
         User's message:\n{}",
        user_message
    )
}

pub fn email_drafting_prompt(recipient: &str, subject: &str, user_message: &str) -> String {
    format!(
        r#"You draft emails on behalf of the user.

Instructions:
- Address the email to {recipient}.
- The subject line is: "{subject}".
- Cover the points and context in the user's message below.
- Match the tone of the user's message (formal, informal, urgent, friendly, concerned).
- Write in the first person singular.
- Return only the email body, without the subject line.

User's message:
"{user_message}""#,
        recipient = recipient,
        subject = subject,
        user_message = user_message,
    )
}

pub fn document_query_prompt(question: &str, file_names: &[String], content: &str) -> String {
    let file_list = file_names
        .iter()
        .map(|name| format!("- {}", name))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "The following documents were analyzed:\n{}\n\n\
         Extracted text:\n---\n{}\n---\n\n\
         Answer the user's request using only the documents above. \
         Mention which document each point comes from.\n\n\
         User's request:\n{}",
        file_list, content, question
    )
}

pub fn internet_search_prompt(query: &str, search_context: &str) -> String {
    format!(
        "Use the search results below to answer the question. \
         Cite the source URLs you relied on. If the results do not answer it, say so.\n\n\
         Search results:\n---\n{}\n---\n\n\
         Question:\n{}",
        search_context, query
    )
}

fn format_transcript(history: &[TurnMessage]) -> String {
    history
        .iter()
        .map(|m| {
            let role = match m.role {
                MessageRole::User => "User",
                MessageRole::Assistant => "Assistant",
                MessageRole::System => "System",
            };
            format!("{}: {}", role, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_prompt_lists_actions_and_history() {
        let actions = [ActionSummary {
            name: "read_pdfs",
            description: "Read and analyze PDF files",
            required: &["directory_path"],
            optional: &["query"],
        }];
        let history = vec![
            TurnMessage::user("Read PDFs"),
            TurnMessage::assistant("Which directory?"),
        ];

        let prompt = intent_analysis_prompt("/tmp/papers", &history, &actions);

        assert!(prompt.starts_with(INTENT_PROMPT_MARKER));
        assert!(prompt.contains("required fields: directory_path"));
        assert!(prompt.contains("optional fields: query"));
        assert!(prompt.contains("Assistant: Which directory?"));
        assert!(prompt.ends_with("Message: \"/tmp/papers\""));
    }

    #[test]
    fn test_clarification_prompt() {
        let prompt = clarification_prompt(Some("read_pdfs"), &["directory_path".to_string()]);
        assert!(prompt.contains("reading and analyzing PDF files"));
        assert!(prompt.contains("directory_path"));
        assert!(!prompt.contains(INTENT_PROMPT_MARKER));
    }

    #[test]
    fn test_document_prompt_lists_files() {
        let prompt = document_query_prompt(
            "What are these?",
            &["a.pdf".to_string(), "b.pdf".to_string()],
            "text",
        );
        assert!(prompt.contains("- a.pdf\n- b.pdf"));
        assert!(prompt.ends_with("What are these?"));
    }
}
