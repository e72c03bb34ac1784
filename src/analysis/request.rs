use serde_json::Value;
use tracing::debug;

use super::prompts::{analysis_user_prompt, chat_system_prompt, ANALYSIS_SYSTEM_PROMPT};
use super::{AnalysisMode, CHAT_EXCERPT_RECORDS, MAX_ANALYSIS_RECORDS, MAX_PROMPT_RECORDS};
use crate::config::LLMConfig;
use crate::models::{ChatMessage, Credential, Record};
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest, ResponseFormat};

/// Model and sampling parameters shared by analysis and chat requests.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningOptions {
    pub model: String,
    pub analysis_temperature: f32,
    pub chat_temperature: f32,
    /// Most recent history messages forwarded per chat call.
    pub chat_history_limit: usize,
}

impl Default for ReasoningOptions {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_string(),
            analysis_temperature: 0.15,
            chat_temperature: 0.4,
            chat_history_limit: 20,
        }
    }
}

impl From<&LLMConfig> for ReasoningOptions {
    fn from(config: &LLMConfig) -> Self {
        Self {
            model: config.model.clone(),
            analysis_temperature: config.analysis_temperature,
            chat_temperature: config.chat_temperature,
            chat_history_limit: config.chat_history_limit,
        }
    }
}

/// A fully shaped call to the reasoning service, ready to send.
#[derive(Debug, Clone)]
pub struct ReasoningRequest {
    pub credential: Credential,
    pub request: LLMRequest,
    /// Number of records serialized into the prompt.
    pub sampled_records: usize,
}

/// Shape an analysis call. Fails with `Auth` before anything else when no
/// credential is available.
pub fn build_request(
    records: &[Record],
    mode: AnalysisMode,
    credential: Option<&Credential>,
    options: &ReasoningOptions,
) -> AppResult<ReasoningRequest> {
    let credential = credential
        .cloned()
        .ok_or_else(|| AppError::Auth("API key required for AI analysis".to_string()))?;

    let submitted = &records[..records.len().min(MAX_ANALYSIS_RECORDS)];
    let sample = &submitted[..submitted.len().min(MAX_PROMPT_RECORDS)];
    let dataset_json = serialize_records(sample)?;

    debug!(
        mode = %mode,
        total_records = records.len(),
        sampled = sample.len(),
        "Built analysis request"
    );

    Ok(ReasoningRequest {
        credential,
        request: LLMRequest {
            model: options.model.clone(),
            messages: vec![
                LLMMessage::system(ANALYSIS_SYSTEM_PROMPT),
                LLMMessage::user(analysis_user_prompt(mode, &dataset_json)),
            ],
            max_tokens: None,
            temperature: Some(options.analysis_temperature),
            response_format: Some(ResponseFormat::JsonObject),
        },
        sampled_records: sample.len(),
    })
}

/// Shape a chat call: one system message with a data excerpt, then the most
/// recent `chat_history_limit` history messages.
pub fn build_chat_request(
    history: &[ChatMessage],
    records: Option<&[Record]>,
    credential: &Credential,
    options: &ReasoningOptions,
) -> AppResult<ReasoningRequest> {
    let excerpt = records.map(|r| &r[..r.len().min(CHAT_EXCERPT_RECORDS)]);
    let excerpt_json = excerpt.map(serialize_records).transpose()?;

    let keep_from = history.len().saturating_sub(options.chat_history_limit.max(1));
    let mut messages = Vec::with_capacity(history.len() - keep_from + 1);
    messages.push(LLMMessage::system(chat_system_prompt(excerpt_json.as_deref())));
    messages.extend(history[keep_from..].iter().map(LLMMessage::from));

    Ok(ReasoningRequest {
        credential: credential.clone(),
        request: LLMRequest {
            model: options.model.clone(),
            messages,
            max_tokens: None,
            temperature: Some(options.chat_temperature),
            response_format: None,
        },
        sampled_records: excerpt.map_or(0, <[Record]>::len),
    })
}

fn serialize_records(records: &[Record]) -> AppResult<String> {
    let values: Vec<Value> = records.iter().cloned().map(Value::Object).collect();
    serde_json::to_string(&values)
        .map_err(|e| AppError::Internal(format!("failed to serialize records: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;
    use serde_json::json;

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| json!({"Row": i, "Amount_INR": i * 1000}).as_object().cloned().unwrap())
            .collect()
    }

    fn key() -> Credential {
        Credential::new("gsk_key").unwrap()
    }

    fn embedded_dataset(request: &ReasoningRequest) -> Vec<Value> {
        let user = &request.request.messages[1].content;
        let line = user
            .lines()
            .find_map(|l| l.strip_prefix("INPUT DATASET: "))
            .expect("dataset line");
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_missing_credential_is_auth_error() {
        let err = build_request(&records(3), AnalysisMode::FullAudit, None, &ReasoningOptions::default())
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[test]
    fn test_truncates_to_one_hundred() {
        let options = ReasoningOptions::default();
        for (input, expected) in [(150, 100), (100, 100), (101, 100), (99, 99), (0, 0)] {
            let request = build_request(&records(input), AnalysisMode::FullAudit, Some(&key()), &options).unwrap();
            assert_eq!(request.sampled_records, expected);
            let embedded = embedded_dataset(&request);
            assert_eq!(embedded.len(), expected);
            if expected > 0 {
                assert_eq!(embedded[0]["Row"], 0);
                assert_eq!(embedded[expected - 1]["Row"], expected - 1);
            }
        }
    }

    #[test]
    fn test_request_shape() {
        let options = ReasoningOptions::default();
        let request = build_request(&records(10), AnalysisMode::RiskModeling, Some(&key()), &options).unwrap();

        let messages = &request.request.messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert!(messages[0].content.contains("strict JSON"));
        assert_eq!(messages[1].role, MessageRole::User);
        assert!(messages[1].content.starts_with("TASK: Construct a stress-test scenario model"));
        assert_eq!(request.request.response_format, Some(ResponseFormat::JsonObject));
        assert_eq!(request.request.temperature, Some(0.15));
        assert_eq!(request.request.model, "llama-3.3-70b-versatile");
        assert_eq!(request.credential.expose(), "gsk_key");
    }

    #[test]
    fn test_chat_request_excerpt_and_history() {
        let options = ReasoningOptions::default();
        let data = records(45);
        let history = vec![
            ChatMessage::assistant("welcome"),
            ChatMessage::user("Which client pays most?"),
        ];
        let request = build_chat_request(&history, Some(&data), &key(), &options).unwrap();

        assert_eq!(request.sampled_records, 30);
        let messages = &request.request.messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, MessageRole::System);
        assert!(messages[0].content.contains("\"Row\":29"));
        assert!(!messages[0].content.contains("\"Row\":30"));
        assert_eq!(messages[2].content, "Which client pays most?");
        assert_eq!(request.request.response_format, None);
        assert_eq!(request.request.temperature, Some(0.4));
    }

    #[test]
    fn test_chat_history_is_capped_to_latest() {
        let options = ReasoningOptions {
            chat_history_limit: 4,
            ..ReasoningOptions::default()
        };
        let history: Vec<ChatMessage> = (0..10).map(|i| ChatMessage::user(format!("q{i}"))).collect();
        let request = build_chat_request(&history, None, &key(), &options).unwrap();

        let contents: Vec<&str> = request.request.messages[1..].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q6", "q7", "q8", "q9"]);
        assert!(request.request.messages[0].content.contains("excerpt: None"));
    }
}
