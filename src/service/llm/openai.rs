//! Integration with OpenAI-compatible Large Language Model services.
//!
//! This module provides a thin wrapper around `async-openai` chat completions,
//! which is all the extractor needs: one prompt in, one text response out.

use std::{sync::Arc, time::Duration};

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse},
};
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::base::{config::Config, types::Res};

use super::{GenericLlmClient, LlmClient};

const RETRY_DELAY_MS: u64 = 1000;
const MAX_RETRY_DELAY_MS: u64 = 30_000;

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config, api_key: &str) -> Self {
        let client = OpenAiLlmClient::new(config, api_key);
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// OpenAI LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    config: Config,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config, api_key: &str) -> Self {
        let cfg = OpenAIConfig::new().with_api_key(api_key).with_api_base(&config.openai_api_base);

        Self {
            client: Client::with_config(cfg),
            config: config.clone(),
        }
    }

    /// Build the chat completion request for a single user prompt.
    fn build_request(&self, prompt: &str, max_tokens: u32) -> Res<CreateChatCompletionRequest> {
        let message = ChatCompletionRequestUserMessageArgs::default().content(prompt).build()?;

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(&self.config.openai_model).max_completion_tokens(max_tokens).messages(vec![message.into()]);

        // Add the temperature for the non-reasoning models.
        if self.config.openai_model.starts_with("gpt") {
            request.temperature(self.config.openai_temperature);
        }

        Ok(request.build()?)
    }

    /// Helper function to make OpenAI API calls with retry logic and timeout handling.
    async fn call_openai_api(&self, request: CreateChatCompletionRequest) -> Res<CreateChatCompletionResponse> {
        let max_retries = self.config.openai_max_retries;
        let call_timeout = Duration::from_secs(self.config.openai_timeout_secs);
        let mut retries = 0;

        loop {
            let result = timeout(call_timeout, self.client.chat().create(request.clone())).await;

            match result {
                Ok(Ok(response)) => {
                    debug!("OpenAI API call succeeded after {} attempts", retries + 1);
                    return Ok(response);
                }
                Ok(Err(err)) => {
                    if retries >= max_retries {
                        return Err(anyhow::anyhow!("OpenAI API call failed after {} attempts: {err}", retries + 1));
                    }
                    retries += 1;
                    warn!("OpenAI API call failed, retrying {retries}/{max_retries}: {err}");

                    tokio::time::sleep(retry_delay(retries)).await;
                }
                Err(_) => {
                    if retries >= max_retries {
                        return Err(anyhow::anyhow!("OpenAI API call timed out after {} attempts", retries + 1));
                    }
                    retries += 1;
                    warn!("OpenAI API call timed out, retrying {retries}/{max_retries}");

                    tokio::time::sleep(retry_delay(retries)).await;
                }
            }
        }
    }
}

/// Exponential backoff before the given retry (1-based), capped at [`MAX_RETRY_DELAY_MS`].
fn retry_delay(retry: u32) -> Duration {
    let factor = 2_u64.checked_pow(retry.saturating_sub(1)).unwrap_or(u64::MAX);

    Duration::from_millis(RETRY_DELAY_MS.saturating_mul(factor).min(MAX_RETRY_DELAY_MS))
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::complete", skip(self, prompt))]
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Res<String> {
        let request = self.build_request(prompt, max_tokens)?;
        let response = self.call_openai_api(request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("OpenAI response contained no message content."))
    }
}

// Tests.
