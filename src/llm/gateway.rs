use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use super::{
    anthropic, is_reasoning_model, openai, Completion, CompletionRequest, LlmError, LlmGateway,
    Provider, ProviderAvailability,
};
use crate::config::LlmConfig;

/// Fully resolved call handed to a vendor backend.
#[derive(Debug)]
pub(super) struct ResolvedRequest<'a> {
    pub base_url: &'a str,
    pub api_key: &'a str,
    pub model: &'a str,
    pub messages: &'a [super::ChatMessage],
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// What a vendor backend hands back before provider/model are attached.
#[derive(Debug)]
pub(super) struct RawCompletion {
    pub text: String,
    pub finish_reason: Option<String>,
    pub usage: Option<super::TokenUsage>,
    pub id: Option<String>,
}

/// Gateway over the real vendor HTTP APIs.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    config: LlmConfig,
}

impl HttpGateway {
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl LlmGateway for HttpGateway {
    #[instrument(skip(self, request), fields(provider, model))]
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        if request.messages.is_empty() {
            return Err(LlmError::EmptyMessages);
        }

        let provider = request.provider.unwrap_or(self.config.default_provider);
        let api_key = self
            .config
            .api_key(provider)
            .ok_or(LlmError::NotConfigured(provider))?;
        let model = request
            .model
            .as_deref()
            .unwrap_or_else(|| self.config.default_model(provider));

        let span = tracing::Span::current();
        span.record("provider", tracing::field::display(provider));
        span.record("model", model);

        let temperature = match request.temperature {
            Some(_) if is_reasoning_model(model) => {
                debug!("dropping temperature for reasoning model");
                None
            }
            t => t,
        };

        let resolved = ResolvedRequest {
            base_url: match provider {
                Provider::OpenAi => &self.config.openai_base_url,
                Provider::Anthropic => &self.config.anthropic_base_url,
            },
            api_key,
            model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature,
        };

        let result = match provider {
            Provider::OpenAi => openai::complete(&self.client, &resolved).await,
            Provider::Anthropic => anthropic::complete(&self.client, &resolved).await,
        };

        match result {
            Ok(raw) => {
                debug!(chars = raw.text.len(), finish_reason = ?raw.finish_reason, "completion received");
                Ok(Completion {
                    text: raw.text,
                    finish_reason: raw.finish_reason,
                    usage: raw.usage,
                    id: raw.id,
                    provider,
                    model: model.to_string(),
                })
            }
            Err(e) => {
                warn!(error = %e, "completion failed");
                Err(e)
            }
        }
    }

    fn availability(&self) -> ProviderAvailability {
        ProviderAvailability {
            openai: self.config.openai_api_key.is_some(),
            anthropic: self.config.anthropic_api_key.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::llm::ChatMessage;

    fn gateway() -> HttpGateway {
        HttpGateway::new(AppConfig::test().llm).expect("client builds")
    }

    #[tokio::test]
    async fn rejects_empty_message_list() {
        let err = gateway()
            .complete(CompletionRequest::new(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyMessages));
    }

    #[tokio::test]
    async fn unconfigured_provider_is_reported_before_any_network_call() {
        let mut req = CompletionRequest::new(vec![ChatMessage::user("hi")]);
        req.provider = Some(Provider::Anthropic);
        let err = gateway().complete(req).await.unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured(Provider::Anthropic)));
    }

    #[test]
    fn availability_follows_credentials() {
        let a = gateway().availability();
        assert!(a.openai);
        assert!(!a.anthropic);
    }
}
