use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use tracing::instrument;

use crate::base::types::{Credentials, EventRecord, Res, Void};

pub mod surreal;

/// Credential key holding the destination phone number.
pub const PHONE_NUMBER_KEY: &str = "whatsapp_phone_number";
/// Credential key holding the language model API key.
pub const LLM_API_KEY_KEY: &str = "llm_api_key";

// Traits.

/// Generic database client trait that clients must implement.
///
/// This trait defines the key-value credential store used to bootstrap the
/// bot, and the event store that accepted events are recorded in.
#[async_trait]
pub trait GenericDbClient: Send + Sync + 'static {
    /// Gets a credential by key, or `None` if it has never been set.
    async fn get_credential(&self, key: &str) -> Res<Option<String>>;

    /// Sets (or replaces) a credential.
    async fn set_credential(&self, key: &str, value: &str) -> Void;

    /// Records an accepted event for the given user.
    async fn add_event(&self, user_id: &str, event: &EventRecord) -> Void;

    /// Gets the events recorded for the given user, oldest first.
    async fn get_events(&self, user_id: &str) -> Res<Vec<EventRecord>>;
}

// Structs.

/// Database client for mention-bot.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DbClient {
    inner: Arc<dyn GenericDbClient>,
}

impl Deref for DbClient {
    type Target = dyn GenericDbClient;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DbClient {
    pub fn new(inner: Arc<dyn GenericDbClient>) -> Self {
        Self { inner }
    }

    /// Loads both credentials needed to run the bot.
    ///
    /// Fails if either one is missing, since the bot cannot run without them.
    #[instrument(skip(self))]
    pub async fn load_credentials(&self) -> Res<Credentials> {
        let phone_number = self.require_credential(PHONE_NUMBER_KEY).await?;
        let llm_api_key = self.require_credential(LLM_API_KEY_KEY).await?;

        Ok(Credentials { phone_number, llm_api_key })
    }

    /// Stores both credentials.
    #[instrument(skip_all)]
    pub async fn store_credentials(&self, credentials: &Credentials) -> Void {
        self.set_credential(PHONE_NUMBER_KEY, &credentials.phone_number).await?;
        self.set_credential(LLM_API_KEY_KEY, &credentials.llm_api_key).await?;

        Ok(())
    }

    async fn require_credential(&self, key: &str) -> Res<String> {
        match self.get_credential(key).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(anyhow::anyhow!("Credential `{key}` was not found in the credential store. Did you run 'mention-bot init'?")),
            Err(err) => Err(anyhow::anyhow!("Failed to retrieve credential `{key}` from the credential store: {err}. Did you run 'mention-bot init'?")),
        }
    }
}
