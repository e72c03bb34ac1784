use async_trait::async_trait;
use tracing::{error, info, warn};

use super::request::{build_chat_request, build_request, ReasoningOptions};
use super::result::parse_analysis_result;
use super::AnalysisMode;
use crate::llm::LLM;
use crate::models::{AnalysisResult, ChatMessage, Credential, Record};
use crate::types::{AppError, AppResult};

/// Reply shown in the conversation when a chat call fails for any reason.
pub const CHAT_FALLBACK_REPLY: &str = "Neural uplink disrupted. Check the API key in System Config and try again.";

/// The opaque reasoning capability: structured analysis and free-text chat.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Single attempt, no retry. Any failure means "no new result".
    async fn analyze(
        &self,
        records: &[Record],
        mode: AnalysisMode,
        credential: Option<&Credential>,
    ) -> AppResult<AnalysisResult>;

    /// Never fails: faults are replaced by [`CHAT_FALLBACK_REPLY`].
    async fn chat(
        &self,
        history: &[ChatMessage],
        records: Option<&[Record]>,
        credential: &Credential,
    ) -> String;
}

/// [`ReasoningService`] backed by a chat-completion endpoint.
pub struct RemoteReasoning {
    llm: LLM,
    options: ReasoningOptions,
}

impl RemoteReasoning {
    pub fn new(llm: LLM, options: ReasoningOptions) -> Self {
        Self { llm, options }
    }

    async fn try_chat(
        &self,
        history: &[ChatMessage],
        records: Option<&[Record]>,
        credential: &Credential,
    ) -> AppResult<String> {
        let call = build_chat_request(history, records, credential, &self.options)?;
        let response = self
            .llm
            .create_chat_completion(&call.credential, &call.request)
            .await?;
        Ok(response.content)
    }
}

#[async_trait]
impl ReasoningService for RemoteReasoning {
    async fn analyze(
        &self,
        records: &[Record],
        mode: AnalysisMode,
        credential: Option<&Credential>,
    ) -> AppResult<AnalysisResult> {
        let call = build_request(records, mode, credential, &self.options)?;

        info!(
            provider = %self.llm.provider_name(),
            mode = %mode,
            sampled = call.sampled_records,
            "Requesting remote analysis"
        );

        let response = self
            .llm
            .create_chat_completion(&call.credential, &call.request)
            .await
            .map_err(|e| {
                error!(error = %e, "Remote analysis call failed");
                match e {
                    AppError::LLMApi(message) => AppError::Analysis(message),
                    other => other,
                }
            })?;

        let result = parse_analysis_result(&response.content).map_err(|e| {
            error!(error = %e, "Remote analysis reply rejected");
            e
        })?;

        info!(
            score = result.score,
            findings = result.findings.len(),
            alerts = result.alerts.len(),
            recommendations = result.recommendations.len(),
            tokens = response.usage.total_tokens,
            "Remote analysis completed"
        );
        Ok(result)
    }

    async fn chat(
        &self,
        history: &[ChatMessage],
        records: Option<&[Record]>,
        credential: &Credential,
    ) -> String {
        match self.try_chat(history, records, credential).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Chat call failed, replying with fallback");
                CHAT_FALLBACK_REPLY.to_string()
            }
        }
    }
}
