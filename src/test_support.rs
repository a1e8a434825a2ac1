//! Test doubles shared by the unit tests

use crate::error::DialogError;
use crate::models::{Parameters, Privacy, TurnMessage};
use crate::oracle::Oracle;
use crate::prompts::INTENT_PROMPT_MARKER;
use crate::providers::{
    ActionHandler, CommitResult, DirectOutput, ExecutionMode, StagedAction, StagedPayload,
};
use crate::registry::ActionRegistry;
use crate::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const REJECTION_REASON: &str = "I couldn't find an email address for John.";

/// Oracle with separate scripted queues for classification and other prompts
#[derive(Default)]
pub struct ScriptedOracle {
    classifications: Mutex<VecDeque<String>>,
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    privacies: Mutex<Vec<Privacy>>,
    fail_classifications: AtomicBool,
    fail_answers: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_classification(&self, raw: impl Into<String>) {
        self.classifications.lock().unwrap().push_back(raw.into());
    }

    pub fn push_answer(&self, raw: impl Into<String>) {
        self.answers.lock().unwrap().push_back(raw.into());
    }

    pub fn fail_classifications(&self) {
        self.fail_classifications.store(true, Ordering::SeqCst);
    }

    pub fn fail_answers(&self) {
        self.fail_answers.store(true, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn privacies(&self) -> Vec<Privacy> {
        self.privacies.lock().unwrap().clone()
    }

    pub fn classification_prompts(&self) -> Vec<String> {
        self.prompts()
            .into_iter()
            .filter(|p| p.starts_with(INTENT_PROMPT_MARKER))
            .collect()
    }

    pub fn classification_count(&self) -> usize {
        self.classification_prompts().len()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(
        &self,
        prompt: &str,
        _history: &[TurnMessage],
        privacy: Privacy,
    ) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.privacies.lock().unwrap().push(privacy);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if prompt.starts_with(INTENT_PROMPT_MARKER) {
            if self.fail_classifications.load(Ordering::SeqCst) {
                return Err(DialogError::LlmError("classifier offline".to_string()));
            }
            return Ok(self
                .classifications
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default());
        }

        if self.fail_answers.load(Ordering::SeqCst) {
            return Err(DialogError::LlmError("model offline".to_string()));
        }
        Ok(self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "Scripted answer".to_string()))
    }
}

/// Handler that records calls instead of doing anything
pub struct RecordingHandler {
    name: &'static str,
    required: &'static [&'static str],
    optional: &'static [&'static str],
    mode: ExecutionMode,
    items: Vec<String>,
    pub stage_calls: AtomicUsize,
    pub commit_calls: AtomicUsize,
    pub direct_calls: AtomicUsize,
    pub fail_commit: AtomicBool,
    /// Commit returns `success: false` instead of an error
    pub soft_fail_commit: AtomicBool,
    pub fail_stage: AtomicBool,
    pub reject_stage: AtomicBool,
    pub fail_direct: AtomicBool,
    commit_delay: Mutex<Option<Duration>>,
    last_parameters: Mutex<Option<Parameters>>,
}

impl RecordingHandler {
    pub fn new(
        name: &'static str,
        required: &'static [&'static str],
        optional: &'static [&'static str],
        mode: ExecutionMode,
    ) -> Self {
        Self {
            name,
            required,
            optional,
            mode,
            items: Vec::new(),
            stage_calls: AtomicUsize::new(0),
            commit_calls: AtomicUsize::new(0),
            direct_calls: AtomicUsize::new(0),
            fail_commit: AtomicBool::new(false),
            soft_fail_commit: AtomicBool::new(false),
            fail_stage: AtomicBool::new(false),
            reject_stage: AtomicBool::new(false),
            fail_direct: AtomicBool::new(false),
            commit_delay: Mutex::new(None),
            last_parameters: Mutex::new(None),
        }
    }

    pub fn with_items(mut self, items: &[&str]) -> Self {
        self.items = items.iter().map(|i| i.to_string()).collect();
        self
    }

    /// Sleep after the commit is recorded, as a slow transport would
    pub fn set_commit_delay(&self, delay: Duration) {
        *self.commit_delay.lock().unwrap() = Some(delay);
    }

    pub fn last_parameters(&self) -> Option<Parameters> {
        self.last_parameters.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.stage_calls.load(Ordering::SeqCst)
            + self.commit_calls.load(Ordering::SeqCst)
            + self.direct_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActionHandler for RecordingHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "Recording test handler"
    }

    fn required_parameters(&self) -> &'static [&'static str] {
        self.required
    }

    fn optional_parameters(&self) -> &'static [&'static str] {
        self.optional
    }

    fn mode(&self) -> ExecutionMode {
        self.mode
    }

    async fn stage(&self, parameters: &Parameters, _raw_message: &str) -> Result<StagedAction> {
        self.stage_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_parameters.lock().unwrap() = Some(parameters.clone());

        if self.reject_stage.load(Ordering::SeqCst) {
            return Err(DialogError::Rejected(REJECTION_REASON.to_string()));
        }
        if self.fail_stage.load(Ordering::SeqCst) {
            return Err(DialogError::LlmError("drafting model offline".to_string()));
        }

        Ok(StagedAction {
            preview: format!("Draft for {}", self.name),
            payload: StagedPayload::new(parameters)?,
        })
    }

    async fn commit(&self, _payload: &StagedPayload) -> Result<CommitResult> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.commit_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(DialogError::ProviderError("transport down".to_string()));
        }
        if self.soft_fail_commit.load(Ordering::SeqCst) {
            return Ok(CommitResult {
                success: false,
                message: "mailbox full".to_string(),
            });
        }

        Ok(CommitResult {
            success: true,
            message: format!("{} done", self.name),
        })
    }

    async fn execute_direct(&self, parameters: &Parameters) -> Result<DirectOutput> {
        self.direct_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_parameters.lock().unwrap() = Some(parameters.clone());

        if self.fail_direct.load(Ordering::SeqCst) {
            return Err(DialogError::ProviderError("backend unreachable".to_string()));
        }

        Ok(DirectOutput {
            message: format!("{} done", self.name),
            items: self.items.clone(),
            analyzed_directory: parameters.get("directory_path").cloned(),
        })
    }
}

pub struct Recorders {
    pub email: Arc<RecordingHandler>,
    pub pdfs: Arc<RecordingHandler>,
    pub search: Arc<RecordingHandler>,
    pub meeting: Arc<RecordingHandler>,
}

impl Recorders {
    pub fn total_calls(&self) -> usize {
        self.email.calls() + self.pdfs.calls() + self.search.calls() + self.meeting.calls()
    }
}

/// Registry with the four built-in action contracts backed by recorders
pub fn recording_registry() -> (Arc<ActionRegistry>, Recorders) {
    let recorders = Recorders {
        email: Arc::new(RecordingHandler::new(
            "send_email",
            &["recipient_name", "subject"],
            &["body", "tone"],
            ExecutionMode::Staged,
        )),
        pdfs: Arc::new(
            RecordingHandler::new(
                "read_pdfs",
                &["directory_path"],
                &["query"],
                ExecutionMode::Direct,
            )
            .with_items(&["a.pdf", "b.pdf"]),
        ),
        search: Arc::new(RecordingHandler::new(
            "internet_search",
            &["query"],
            &[],
            ExecutionMode::Direct,
        )),
        meeting: Arc::new(RecordingHandler::new(
            "schedule_meeting",
            &["participants", "time"],
            &["topic"],
            ExecutionMode::Staged,
        )),
    };

    let mut registry = ActionRegistry::new();
    registry.register_handler(recorders.email.clone());
    registry.register_handler(recorders.pdfs.clone());
    registry.register_handler(recorders.search.clone());
    registry.register_handler(recorders.meeting.clone());

    (Arc::new(registry), recorders)
}
