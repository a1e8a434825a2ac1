//! Environment-driven configuration
//!
//! Values come from the process environment (optionally seeded from `.env`
//! by the binaries). Every setting has a default except secrets.

use crate::error::DialogError;
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub ollama_url: String,
    pub ollama_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub contacts_path: PathBuf,
    pub outbox_dir: PathBuf,
    pub from_address: String,
    pub cc_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub tavily_api_key: Option<String>,
    pub max_results: usize,
}

#[derive(Debug, Clone)]
pub struct DocumentConfig {
    pub pdftotext_bin: String,
    /// Upper bound on concatenated document text handed to the oracle
    pub max_context_chars: usize,
}

#[derive(Debug, Clone)]
pub struct DialogConfig {
    pub turn_deadline: Duration,
    /// Number of recent turns sent to the oracle as context
    pub history_window: usize,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            turn_deadline: Duration::from_secs(45),
            history_window: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_port: u16,
    /// HTTP sessions untouched this long are dropped
    pub session_idle_ttl: Duration,
    pub oracle: OracleConfig,
    pub email: EmailConfig,
    pub search: SearchConfig,
    pub documents: DocumentConfig,
    pub dialog: DialogConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_value("PORT", &raw)?,
            None => 8080,
        };

        let session_idle_ttl = Duration::from_secs(parse_or(&get, "SESSION_IDLE_TTL_SECS", 3600)?);
        if session_idle_ttl.is_zero() {
            return Err(DialogError::ConfigError(
                "SESSION_IDLE_TTL_SECS must be greater than zero".to_string(),
            ));
        }

        let oracle = OracleConfig {
            ollama_url: get("OLLAMA_URL")
                .unwrap_or_else(|| "http://localhost:11434".to_string())
                .trim_end_matches('/')
                .to_string(),
            ollama_model: get("OLLAMA_MODEL").unwrap_or_else(|| "llama3.2".to_string()),
            gemini_api_key: get("GEMINI_API_KEY")
                .filter(|key| key != "your_gemini_api_key_here"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            request_timeout: Duration::from_secs(parse_or(&get, "ORACLE_TIMEOUT_SECS", 60)?),
        };

        let email = EmailConfig {
            contacts_path: PathBuf::from(
                get("CONTACTS_PATH").unwrap_or_else(|| "contacts.json".to_string()),
            ),
            outbox_dir: PathBuf::from(get("MAIL_OUTBOX_DIR").unwrap_or_else(|| "outbox".to_string())),
            from_address: get("EMAIL_FROM_ADDRESS")
                .unwrap_or_else(|| "assistant@localhost".to_string()),
            cc_address: get("EMAIL_CC_ADDRESS"),
        };

        let search = SearchConfig {
            tavily_api_key: get("TAVILY_API_KEY"),
            max_results: parse_or(&get, "SEARCH_MAX_RESULTS", 5)?,
        };

        let documents = DocumentConfig {
            pdftotext_bin: get("PDFTOTEXT_BIN").unwrap_or_else(|| "pdftotext".to_string()),
            max_context_chars: parse_or(&get, "PDF_MAX_CONTEXT_CHARS", 24_000)?,
        };

        let defaults = DialogConfig::default();
        let dialog = DialogConfig {
            turn_deadline: Duration::from_secs(parse_or(
                &get,
                "TURN_DEADLINE_SECS",
                defaults.turn_deadline.as_secs(),
            )?),
            history_window: parse_or(&get, "HISTORY_WINDOW", defaults.history_window)?,
        };

        if dialog.turn_deadline.is_zero() {
            return Err(DialogError::ConfigError(
                "TURN_DEADLINE_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_port,
            session_idle_ttl,
            oracle,
            email,
            search,
            documents,
            dialog,
        })
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        DialogError::ConfigError(format!("{} has an invalid value: {:?}", key, raw))
    })
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
