//! Dialog orchestrator - one user message in, one reply out
//!
//! IDLE → classify → {answer | clarify | stage → AWAITING_CONFIRMATION | execute}
//! AWAITING_CLARIFICATION → merge reply → classify again
//! AWAITING_CONFIRMATION → "yes" commits, anything else cancels
//!
//! A turn is planned against an immutable view of the session and applied
//! in a single step afterwards, so a turn that times out or fails leaves no
//! partial state behind.

use crate::classifier::IntentClassifier;
use crate::config::DialogConfig;
use crate::error::DialogError;
use crate::formatter;
use crate::models::{Intent, IntentResult, Outcome, Parameters, Privacy, SideEffects, TurnMessage, TurnReply};
use crate::oracle::Oracle;
use crate::prompts;
use crate::providers::{is_blank, ExecutionMode};
use crate::registry::{ActionDescriptor, ActionRegistry, UnknownAction};
use crate::session::{AnalyzedDocuments, DialogState, PendingAction, Session, Transition};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

pub struct DialogOrchestrator {
    classifier: IntentClassifier,
    registry: Arc<ActionRegistry>,
    oracle: Arc<dyn Oracle>,
    config: DialogConfig,
}

impl DialogOrchestrator {
    pub fn new(oracle: Arc<dyn Oracle>, registry: Arc<ActionRegistry>, config: DialogConfig) -> Self {
        Self {
            classifier: IntentClassifier::new(oracle.clone(), registry.clone()),
            registry,
            oracle,
            config,
        }
    }

    /// Process one user message. Always produces a reply.
    pub async fn handle_message(&self, session: &mut Session, message: &str) -> TurnReply {
        let start_time = Instant::now();
        let from = session.status();

        let transition = match timeout(self.config.turn_deadline, self.plan_turn(session, message)).await {
            Ok(transition) => transition,
            Err(_) => {
                warn!(
                    session_id = %session.id(),
                    deadline_secs = self.config.turn_deadline.as_secs(),
                    "Turn deadline exceeded, returning to idle"
                );
                Transition::idle(deadline_text(session, message))
            }
        };

        let reply = session.apply(message, transition);

        info!(
            session_id = %session.id(),
            from = ?from,
            to = ?session.status(),
            awaiting_confirmation = reply.awaiting_confirmation,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Turn complete"
        );

        reply
    }

    async fn plan_turn(&self, session: &Session, message: &str) -> Transition {
        let history = session.history().recent(self.config.history_window);

        match session.state() {
            DialogState::AwaitingConfirmation(pending) => {
                self.resolve_confirmation(pending, message).await
            }
            DialogState::AwaitingClarification(pending) => {
                let mut result = self.classifier.classify(message, history).await;
                carry_over(pending, &mut result);
                self.route(result, message, history).await
            }
            DialogState::Idle => {
                if let Some(documents) = session.analyzed_documents() {
                    if asks_for_document_list(message) {
                        debug!(directory = %documents.directory, "Answering from analyzed documents");
                        return Transition::idle(formatter::document_listing(documents));
                    }
                }
                let result = self.classifier.classify(message, history).await;
                self.route(result, message, history).await
            }
        }
    }

    async fn route(&self, result: IntentResult, message: &str, history: &[TurnMessage]) -> Transition {
        let IntentResult {
            intent,
            privacy,
            action,
            parameters,
        } = result;

        match intent {
            Intent::GeneralInquiry => self.answer(message, history, privacy).await,

            Intent::ClarificationNeeded => match action.as_deref() {
                None => self.clarify(None, parameters, Vec::new(), history).await,
                Some(name) => match self.registry.resolve(name) {
                    Ok(descriptor) => {
                        let missing = descriptor.missing_parameters(&parameters);
                        self.clarify(Some(descriptor.name), parameters, missing, history).await
                    }
                    Err(unknown) => unsupported(unknown),
                },
            },

            Intent::ActionRequiredConfirm | Intent::ActionRequiredProceed => {
                let Some(name) = action.as_deref() else {
                    warn!(intent = %intent, "Action intent without an action name");
                    return self.clarify(None, parameters, Vec::new(), history).await;
                };

                let descriptor = match self.registry.resolve(name) {
                    Ok(descriptor) => descriptor,
                    Err(unknown) => return unsupported(unknown),
                };

                let missing = descriptor.missing_parameters(&parameters);
                if !missing.is_empty() {
                    info!(
                        action = descriptor.name,
                        missing = ?missing,
                        "Required parameters missing, asking for clarification"
                    );
                    return self.clarify(Some(descriptor.name), parameters, missing, history).await;
                }

                self.invoke(descriptor, intent, parameters, message).await
            }
        }
    }

    async fn invoke(
        &self,
        descriptor: &ActionDescriptor,
        intent: Intent,
        parameters: Parameters,
        message: &str,
    ) -> Transition {
        let action = descriptor.name;
        let handler = descriptor.handler();

        match descriptor.mode {
            ExecutionMode::Staged => {
                if intent == Intent::ActionRequiredProceed {
                    debug!(action, "Staging side-effecting action despite proceed intent");
                }

                match handler.stage(&parameters, message).await {
                    Ok(staged) => {
                        info!(
                            action,
                            fingerprint = %staged.payload.fingerprint(),
                            "Action staged, awaiting confirmation"
                        );
                        let outcome = Outcome::drafted(staged.preview);
                        Transition::to(
                            DialogState::AwaitingConfirmation(PendingAction::staged(
                                action,
                                parameters,
                                staged.payload,
                            )),
                            formatter::confirmation_request(action, &outcome),
                        )
                    }
                    Err(e) => provider_failure(action, "stage", e),
                }
            }

            ExecutionMode::Direct => match handler.execute_direct(&parameters).await {
                Ok(output) => {
                    info!(action, items = output.items.len(), "Action executed");
                    let documents = output.analyzed_directory.clone().map(|directory| {
                        AnalyzedDocuments {
                            directory,
                            files: output.items.clone(),
                        }
                    });
                    let outcome = Outcome::executed(
                        formatter::direct_result(action, &output),
                        SideEffects::default(),
                    );
                    Transition::idle(formatter::outcome_text(&outcome))
                        .completed(action)
                        .with_documents(documents)
                }
                Err(e) => provider_failure(action, "execute", e),
            },
        }
    }

    async fn resolve_confirmation(&self, pending: &PendingAction, reply: &str) -> Transition {
        let (Some(action), Some(payload)) = (pending.action.as_deref(), pending.staged.as_ref()) else {
            error!("Confirmation pending without a staged action");
            return Transition::idle(formatter::GENERIC_FAILURE);
        };

        if !is_affirmative(reply) {
            info!(action, "Staged action cancelled by user");
            return Transition::idle(formatter::cancellation(action));
        }

        let descriptor = match self.registry.resolve(action) {
            Ok(descriptor) => descriptor,
            Err(unknown) => return provider_failure(action, "commit", unknown.into()),
        };

        info!(action, fingerprint = %payload.fingerprint(), "Committing confirmed action");

        match descriptor.handler().commit(payload).await {
            Ok(result) if result.success => {
                let outcome = Outcome::executed(
                    result.message,
                    SideEffects {
                        committed: true,
                        detail: Some(payload.fingerprint()),
                    },
                );
                Transition::idle(formatter::outcome_text(&outcome)).completed(action)
            }
            Ok(result) => {
                warn!(action, message = %result.message, "Commit reported failure");
                Transition::idle(formatter::outcome_text(&Outcome::failed(formatter::GENERIC_FAILURE)))
            }
            Err(e) => provider_failure(action, "commit", e),
        }
    }

    async fn clarify(
        &self,
        action: Option<&'static str>,
        parameters: Parameters,
        missing: Vec<String>,
        history: &[TurnMessage],
    ) -> Transition {
        let prompt = prompts::clarification_prompt(action, &missing);

        let text = match self.oracle.complete(&prompt, history, Privacy::Private).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => formatter::fallback_clarification(action, &missing),
            Err(e) => {
                warn!(error = %e, "Clarification request failed, using fallback text");
                formatter::fallback_clarification(action, &missing)
            }
        };

        Transition::to(
            DialogState::AwaitingClarification(PendingAction::partial(
                action.map(str::to_string),
                parameters,
                missing,
            )),
            text,
        )
    }

    async fn answer(&self, message: &str, history: &[TurnMessage], privacy: Privacy) -> Transition {
        let prompt = prompts::assistant_query_prompt(message);

        match self.oracle.complete(&prompt, history, privacy).await {
            Ok(text) => Transition::idle(formatter::answer(&text)),
            Err(e) => {
                error!(error = %e, "General inquiry failed");
                Transition::idle(formatter::outcome_text(&Outcome::failed(formatter::GENERIC_FAILURE)))
            }
        }
    }
}

/// Only an explicit yes commits a staged action.
pub fn is_affirmative(reply: &str) -> bool {
    matches!(reply.trim().to_ascii_lowercase().as_str(), "yes" | "y")
}

fn asks_for_document_list(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("available")
        && ["paper", "pdf", "file", "document"]
            .iter()
            .any(|noun| lower.contains(noun))
}

/// Keep parameters gathered earlier when the reply continues the same action.
fn carry_over(pending: &PendingAction, result: &mut IntentResult) {
    let Some(pending_action) = pending.action.as_deref() else {
        return;
    };

    match result.action.as_deref() {
        Some(action) if action == pending_action => {}
        None if result.intent == Intent::ClarificationNeeded => {
            result.action = Some(pending_action.to_string());
        }
        _ => return,
    }

    for (key, value) in &pending.parameters {
        if is_blank(value) {
            continue;
        }
        let current = result.parameters.entry(key.clone()).or_default();
        if is_blank(current) {
            *current = value.clone();
        }
    }
}

/// A confirmed commit may already have happened when the deadline fires.
fn deadline_text(session: &Session, message: &str) -> String {
    match session.state() {
        DialogState::AwaitingConfirmation(pending) if is_affirmative(message) => {
            let action = pending.action.as_deref().unwrap_or_default();
            warn!(action, "Deadline hit during commit, outcome unknown");
            formatter::commit_outcome_unknown(action)
        }
        _ => formatter::outcome_text(&Outcome::failed(formatter::DEADLINE_EXCEEDED)),
    }
}

fn unsupported(unknown: UnknownAction) -> Transition {
    warn!(action = %unknown.0, "Classifier named an unregistered action");
    Transition::idle(formatter::unsupported_action(&unknown.0))
}

fn provider_failure(action: &str, phase: &str, err: DialogError) -> Transition {
    let text = match err {
        DialogError::Rejected(reason) => {
            info!(action, phase, reason = %reason, "Action rejected");
            reason
        }
        other => {
            error!(action, phase, error = %other, "Action failed");
            formatter::GENERIC_FAILURE.to_string()
        }
    };
    Transition::idle(formatter::outcome_text(&Outcome::failed(text)))
}
