//! Action registry
//!
//! Fixed name → handler mapping, built once at startup. Each entry carries
//! the parameter contract the orchestrator validates before any handler runs.

use crate::config::AppConfig;
use crate::oracle::Oracle;
use crate::prompts::ActionSummary;
use crate::providers::{
    is_blank, ActionHandler, ContactBook, DocumentProvider, EmailProvider, ExecutionMode,
    InMemoryCalendar, MeetingProvider, OutboxTransport, PdftotextExtractor, SearchProvider,
    TavilyClient,
};
use crate::models::Parameters;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Static per-action contract
pub struct ActionDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub required_parameters: &'static [&'static str],
    pub optional_parameters: &'static [&'static str],
    pub mode: ExecutionMode,
    handler: Arc<dyn ActionHandler>,
}

impl ActionDescriptor {
    pub fn from_handler(handler: Arc<dyn ActionHandler>) -> Self {
        Self {
            name: handler.name(),
            description: handler.description(),
            required_parameters: handler.required_parameters(),
            optional_parameters: handler.optional_parameters(),
            mode: handler.mode(),
            handler,
        }
    }

    pub fn handler(&self) -> &Arc<dyn ActionHandler> {
        &self.handler
    }

    /// Required parameters that are absent or blank, in declaration order
    pub fn missing_parameters(&self, parameters: &Parameters) -> Vec<String> {
        self.required_parameters
            .iter()
            .filter(|key| parameters.get(**key).map_or(true, |v| is_blank(v)))
            .map(|key| key.to_string())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown action: {0}")]
pub struct UnknownAction(pub String);

pub struct ActionRegistry {
    actions: HashMap<&'static str, ActionDescriptor>,
    order: Vec<&'static str>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn register(&mut self, descriptor: ActionDescriptor) {
        let name = descriptor.name;
        if self.actions.insert(name, descriptor).is_some() {
            warn!(action = name, "Replacing previously registered action");
        } else {
            self.order.push(name);
        }
    }

    pub fn register_handler(&mut self, handler: Arc<dyn ActionHandler>) {
        self.register(ActionDescriptor::from_handler(handler));
    }

    pub fn resolve(&self, name: &str) -> std::result::Result<&ActionDescriptor, UnknownAction> {
        self.actions
            .get(name.trim())
            .ok_or_else(|| UnknownAction(name.trim().to_string()))
    }

    /// Action names in registration order
    pub fn list(&self) -> Vec<&'static str> {
        self.order.clone()
    }

    /// Catalog entries for the classification prompt
    pub fn summaries(&self) -> Vec<ActionSummary<'static>> {
        self.order
            .iter()
            .filter_map(|name| self.actions.get(name))
            .map(|d| ActionSummary {
                name: d.name,
                description: d.description,
                required: d.required_parameters,
                optional: d.optional_parameters,
            })
            .collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the registry with the four built-in actions.
pub async fn create_default_registry(
    config: &AppConfig,
    oracle: Arc<dyn Oracle>,
) -> Result<ActionRegistry> {
    let mut registry = ActionRegistry::new();

    let contacts = ContactBook::load(&config.email.contacts_path).await?;
    let transport = Arc::new(OutboxTransport::new(config.email.outbox_dir.clone()));
    registry.register_handler(Arc::new(EmailProvider::new(
        oracle.clone(),
        contacts,
        transport,
        config.email.from_address.clone(),
        config.email.cc_address.clone(),
    )));

    registry.register_handler(Arc::new(DocumentProvider::new(
        oracle.clone(),
        Arc::new(PdftotextExtractor::new(config.documents.pdftotext_bin.clone())),
        config.documents.max_context_chars,
    )));

    let search_backend = TavilyClient::new(
        config.search.tavily_api_key.clone(),
        config.search.max_results,
        config.oracle.request_timeout,
    )?;
    registry.register_handler(Arc::new(SearchProvider::new(
        oracle,
        Arc::new(search_backend),
    )));

    registry.register_handler(Arc::new(MeetingProvider::new(Arc::new(
        InMemoryCalendar::new(),
    ))));

    info!(actions = ?registry.list(), "Action registry initialized");

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::recording_registry;

    #[test]
    fn test_resolve_known_and_unknown() {
        let (registry, _) = recording_registry();

        let descriptor = registry.resolve("send_email").unwrap();
        assert_eq!(descriptor.name, "send_email");
        assert_eq!(descriptor.mode, ExecutionMode::Staged);

        let err = registry.resolve("unsupported_action").err().unwrap();
        assert_eq!(err, UnknownAction("unsupported_action".to_string()));
    }

    #[test]
    fn test_registration_order() {
        let (registry, _) = recording_registry();
        assert_eq!(
            registry.list(),
            vec!["send_email", "read_pdfs", "internet_search", "schedule_meeting"]
        );
        assert_eq!(registry.summaries()[1].required, &["directory_path"]);
    }

    #[test]
    fn test_missing_parameters_treats_blank_as_missing() {
        let (registry, _) = recording_registry();
        let descriptor = registry.resolve("send_email").unwrap();

        let mut params = Parameters::new();
        assert_eq!(
            descriptor.missing_parameters(&params),
            vec!["recipient_name", "subject"]
        );

        params.insert("recipient_name".to_string(), "John".to_string());
        params.insert("subject".to_string(), "   ".to_string());
        assert_eq!(descriptor.missing_parameters(&params), vec!["subject"]);

        params.insert("subject".to_string(), "Meeting tomorrow".to_string());
        assert!(descriptor.missing_parameters(&params).is_empty());
    }
}
