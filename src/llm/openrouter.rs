use crate::llm::provider::LLMAdapter;
use crate::models::Credential;
use crate::types::{AppResult, LLMRequest, LLMResponse};
use async_trait::async_trait;

pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

pub struct OpenRouterAdapter {
    inner: crate::llm::openai::OpenAIAdapter,
}

impl OpenRouterAdapter {
    pub fn new() -> Self {
        Self::with_api_base(OPENROUTER_API_BASE)
    }

    pub fn with_api_base(api_base: &str) -> Self {
        Self {
            inner: crate::llm::openai::OpenAIAdapter::new_with_api_base(api_base),
        }
    }
}

impl Default for OpenRouterAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMAdapter for OpenRouterAdapter {
    async fn create_chat_completion(
        &self,
        credential: &Credential,
        request: &LLMRequest,
    ) -> AppResult<LLMResponse> {
        self.inner.create_chat_completion(credential, request).await
    }
}
