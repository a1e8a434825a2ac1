//! Meeting scheduler (staged)

use super::{optional, require, ActionHandler, CommitResult, ExecutionMode, StagedAction, StagedPayload};
use crate::error::DialogError;
use crate::formatter;
use crate::models::Parameters;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRequest {
    pub participants: Vec<String>,
    pub time: String,
    pub topic: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CalendarEntry {
    pub id: Uuid,
    pub request: MeetingRequest,
    pub booked_at: DateTime<Utc>,
}

#[async_trait]
pub trait CalendarBackend: Send + Sync {
    async fn book(&self, request: &MeetingRequest) -> Result<Uuid>;
}

#[derive(Default)]
pub struct InMemoryCalendar {
    entries: Arc<RwLock<Vec<CalendarEntry>>>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<CalendarEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl CalendarBackend for InMemoryCalendar {
    async fn book(&self, request: &MeetingRequest) -> Result<Uuid> {
        let entry = CalendarEntry {
            id: Uuid::new_v4(),
            request: request.clone(),
            booked_at: Utc::now(),
        };
        let id = entry.id;
        self.entries.write().await.push(entry);
        Ok(id)
    }
}

/// Split "Ana, Raj and Lee" style lists
pub fn split_participants(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .flat_map(|part| part.split(" and "))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct MeetingProvider {
    calendar: Arc<dyn CalendarBackend>,
}

impl MeetingProvider {
    pub fn new(calendar: Arc<dyn CalendarBackend>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl ActionHandler for MeetingProvider {
    fn name(&self) -> &'static str {
        "schedule_meeting"
    }

    fn description(&self) -> &'static str {
        "Put a meeting on the calendar after the user confirms"
    }

    fn required_parameters(&self) -> &'static [&'static str] {
        &["participants", "time"]
    }

    fn optional_parameters(&self) -> &'static [&'static str] {
        &["topic"]
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Staged
    }

    async fn stage(&self, parameters: &Parameters, _raw_message: &str) -> Result<StagedAction> {
        let participants = split_participants(require(parameters, "participants")?);
        if participants.is_empty() {
            return Err(DialogError::InvalidActionInput(
                "No meeting participants given".to_string(),
            ));
        }

        let request = MeetingRequest {
            participants,
            time: require(parameters, "time")?.to_string(),
            topic: optional(parameters, "topic").map(str::to_string),
        };

        Ok(StagedAction {
            preview: formatter::meeting_preview(&request),
            payload: StagedPayload::new(&request)?,
        })
    }

    async fn commit(&self, payload: &StagedPayload) -> Result<CommitResult> {
        let request: MeetingRequest = payload.decode()?;
        let id = self.calendar.book(&request).await?;
        info!(meeting_id = %id, "Meeting booked");

        Ok(CommitResult {
            success: true,
            message: format!(
                "Meeting scheduled with {} for {}.",
                request.participants.join(", "),
                request.time
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_participants() {
        assert_eq!(split_participants("Ana, Raj and Lee"), vec!["Ana", "Raj", "Lee"]);
        assert_eq!(split_participants("Ana;;"), vec!["Ana"]);
        assert!(split_participants(" , ").is_empty());
    }

    #[tokio::test]
    async fn test_stage_then_commit_books_once() {
        let calendar = Arc::new(InMemoryCalendar::new());
        let provider = MeetingProvider::new(calendar.clone());

        let mut params = Parameters::new();
        params.insert("participants".to_string(), "Ana and Raj".to_string());
        params.insert("time".to_string(), "Friday 3pm".to_string());

        let staged = provider.stage(&params, "meet Ana and Raj friday").await.unwrap();
        assert!(staged.preview.contains("Friday 3pm"));
        assert!(calendar.entries().await.is_empty());

        let result = provider.commit(&staged.payload).await.unwrap();
        assert!(result.success);
        assert_eq!(result.message, "Meeting scheduled with Ana, Raj for Friday 3pm.");

        let entries = calendar.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].request.participants, vec!["Ana", "Raj"]);
    }
}
