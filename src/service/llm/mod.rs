pub mod openai;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::Res;

// Traits.

/// Generic LLM client trait that clients must implement.
///
/// The bot only needs a single request/response shape: a prompt goes in, text
/// comes out. Implementing this trait allows different LLM providers to be used.
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Complete the prompt, generating at most `max_tokens` output tokens.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Res<String>;
}

// Structs.

/// LLM client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn GenericLlmClient>,
}

impl Deref for LlmClient {
    type Target = dyn GenericLlmClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LlmClient {
    pub fn new(inner: Arc<dyn GenericLlmClient>) -> Self {
        Self { inner }
    }
}
