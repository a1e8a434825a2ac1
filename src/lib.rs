//! IntelliChat Orchestrator
//!
//! A conversational assistant that:
//! - Classifies every message into an intent with a privacy label
//! - Asks for missing details before running any action
//! - Stages side-effecting actions (email, meetings) and commits them only
//!   after an explicit "yes"
//! - Runs read-only actions (PDF analysis, web search) directly
//! - Keeps private prompts on the local model
//!
//! TURN LOOP:
//! MESSAGE → CLASSIFY → {ANSWER | CLARIFY | STAGE → CONFIRM → COMMIT | EXECUTE} → REPLY

pub mod api;
pub mod classifier;
pub mod config;
pub mod dialog;
pub mod error;
pub mod formatter;
pub mod models;
pub mod oracle;
pub mod prompts;
pub mod providers;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{DialogError, Result};

// Re-export common types
pub use config::AppConfig;
pub use dialog::DialogOrchestrator;
pub use models::*;
pub use session::{Session, SessionStatus, SessionStore};
