use async_trait::async_trait;
use crate::models::Credential;
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse};

/// One chat-completion round trip. The credential is supplied per call so a
/// key changed at runtime takes effect on the next request.
#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(
        &self,
        credential: &Credential,
        request: &LLMRequest,
    ) -> AppResult<LLMResponse>;
}

pub struct LLMProviderConfig {
    pub name: String,
    /// Overrides the provider's default endpoint base.
    pub api_base: Option<String>,
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider_name: String,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let base = provider.api_base.as_deref();
        let adapter: Box<dyn LLMAdapter> = match provider.name.as_str() {
            "groq" => Box::new(match base {
                Some(url) => crate::llm::groq::GroqAdapter::with_api_base(url),
                None => crate::llm::groq::GroqAdapter::new(),
            }),
            "openai" => Box::new(match base {
                Some(url) => crate::llm::openai::OpenAIAdapter::new_with_api_base(url),
                None => crate::llm::openai::OpenAIAdapter::new(),
            }),
            "openrouter" => Box::new(match base {
                Some(url) => crate::llm::openrouter::OpenRouterAdapter::with_api_base(url),
                None => crate::llm::openrouter::OpenRouterAdapter::new(),
            }),
            other => {
                return Err(AppError::InvalidRequest(format!(
                    "Unsupported provider: {other}"
                )))
            }
        };

        Ok(Self {
            adapter,
            provider_name: provider.name,
        })
    }

    /// Wrap an existing adapter, e.g. a test double.
    pub fn from_adapter(name: impl Into<String>, adapter: Box<dyn LLMAdapter>) -> Self {
        Self {
            adapter,
            provider_name: name.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub async fn create_chat_completion(
        &self,
        credential: &Credential,
        request: &LLMRequest,
    ) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(credential, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_providers() {
        for name in ["groq", "openai", "openrouter"] {
            let llm = LLM::new(LLMProviderConfig {
                name: name.to_string(),
                api_base: None,
            })
            .unwrap();
            assert_eq!(llm.provider_name(), name);
        }
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let result = LLM::new(LLMProviderConfig {
            name: "carrier-pigeon".to_string(),
            api_base: None,
        });
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }
}
