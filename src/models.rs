use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::chat::ChatSession;
use crate::config::Config;
use crate::gateway::DataGateway;
use crate::settings::CredentialStore;
use crate::types::{AppError, LLMMessage, MessageRole};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: DataGateway,
    pub credentials: CredentialStore,
    pub chat: Arc<Mutex<ChatSession>>,
}

/// One row of business data: field name to scalar value, in source column order.
pub type Record = serde_json::Map<String, Value>;

/// The ordered records produced by a single ingestion. Replaced wholesale, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Canonical schema: the keys of the first record.
    pub fn fields(&self) -> Vec<String> {
        self.records
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Case-insensitive substring match over every field value.
    pub fn search(&self, term: &str) -> Vec<&Record> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.records.iter().collect();
        }
        self.records
            .iter()
            .filter(|record| {
                record
                    .values()
                    .any(|value| display_value(value).to_lowercase().contains(&needle))
            })
            .collect()
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Impact {
    Low,
    Medium,
    High,
    Critical,
}

impl FromStr for Impact {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Impact::Low),
            "MEDIUM" => Ok(Impact::Medium),
            "HIGH" => Ok(Impact::High),
            "CRITICAL" => Ok(Impact::Critical),
            other => Err(AppError::Analysis(format!("unknown impact level: {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub impact: Impact,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub score: u8,
    pub findings: Vec<String>,
    pub alerts: Vec<String>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for LLMMessage {
    fn from(msg: &ChatMessage) -> Self {
        let role = match msg.role {
            ChatRole::User => MessageRole::User,
            ChatRole::Assistant => MessageRole::Assistant,
        };
        LLMMessage::new(role, msg.content.clone())
    }
}

/// Secret token for the reasoning service. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for blank input.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into().trim().to_string();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Last four characters, for display.
    pub fn hint(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() > 4 {
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("••••{tail}")
        } else {
            "••••".to_string()
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"<redacted>").finish()
    }
}

// API Request/Response types

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: ChatMessage,
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordsQuery {
    pub search: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub fields: Vec<String>,
    pub total: usize,
    pub matched: usize,
    pub records: Vec<Record>,
}

#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    pub source_name: Option<String>,
    pub record_count: usize,
    pub fields: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub revision: u64,
    pub dataset: Option<DatasetSummary>,
    pub analysis: Option<AnalysisResult>,
    pub processing: bool,
    pub ingestion_error: Option<String>,
    pub analysis_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub provider: String,
    pub credential_configured: bool,
}
