//! Per-session transcript
//!
//! Append-only. Turns are never edited or removed once recorded.

use crate::models::TurnMessage;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TurnHistory {
    messages: Vec<TurnMessage>,
}

impl TurnHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: TurnMessage) {
        self.messages.push(message);
    }

    /// The `n` most recent messages, oldest first
    pub fn recent(&self, n: usize) -> &[TurnMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
