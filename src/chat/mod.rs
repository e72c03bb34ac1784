//! Conversational view state.
//!
//! A [`ChatSession`] owns the append-only history for one mounted chat view.
//! It is seeded with a welcome (or pending) message derived from the current
//! dataset and re-seeded whenever the dataset revision changes.

use tracing::info;

use crate::analysis::ReasoningService;
use crate::models::{ChatMessage, Credential, Dataset};
use crate::types::{AppError, AppResult};

pub const PENDING_MESSAGE: &str = "No dataset is connected yet. Load a spreadsheet, CSV or JSON file in the Data Gateway and I will answer from your numbers.";

pub fn welcome_message(dataset: &Dataset) -> String {
    let fields = dataset.fields();
    let fields = if fields.is_empty() {
        "financials".to_string()
    } else {
        fields.join(", ")
    };
    format!(
        "FinAura intelligence link established. I have synthesized your {} data points and am ready for forensic-level questions. Which part of your {} would you like to examine?",
        dataset.len(),
        fields
    )
}

#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    revision: Option<u64>,
}

impl ChatSession {
    /// A freshly mounted view for the given dataset revision.
    pub fn mount(dataset: Option<&Dataset>, revision: u64) -> Self {
        let greeting = match dataset {
            Some(dataset) => welcome_message(dataset),
            None => PENDING_MESSAGE.to_string(),
        };
        Self {
            messages: vec![ChatMessage::assistant(greeting)],
            revision: Some(revision),
        }
    }

    /// Re-mount if the dataset revision moved on. Returns `true` when reset.
    pub fn sync(&mut self, dataset: Option<&Dataset>, revision: u64) -> bool {
        if self.revision == Some(revision) {
            return false;
        }
        *self = Self::mount(dataset, revision);
        true
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send one user turn. Empty input and a missing credential are rejected
    /// before the reasoning service is touched; remote faults arrive as the
    /// fallback reply and are appended like any other answer.
    pub async fn send(
        &mut self,
        service: &dyn ReasoningService,
        input: &str,
        dataset: Option<&Dataset>,
        credential: Option<&Credential>,
    ) -> AppResult<&ChatMessage> {
        if input.trim().is_empty() {
            return Err(AppError::InvalidRequest("message is empty".to_string()));
        }
        let credential = credential
            .ok_or_else(|| AppError::Auth("API key required for the advisor".to_string()))?;

        self.messages.push(ChatMessage::user(input));
        info!(history = self.messages.len(), "Sending chat turn");

        let reply = service
            .chat(&self.messages, dataset.map(Dataset::records), credential)
            .await;
        self.messages.push(ChatMessage::assistant(reply));

        Ok(&self.messages[self.messages.len() - 1])
    }
}
