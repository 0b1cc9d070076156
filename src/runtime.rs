//! Runtime services and shared state for the mention-bot.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::{
    base::{
        config::Config,
        types::{Credentials, Res, Void},
    },
    interaction::watcher::Watcher,
    service::{db::DbClient, llm::LlmClient, page::PageDriver},
};

/// Placeholder in `chat_url` replaced by the stored phone number.
pub const PHONE_PLACEHOLDER: &str = "{phone}";

/// Runtime service context that can be shared across the application.
///
/// This struct holds the configuration, credentials, and every service client.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The credentials read from the credential store.
    pub credentials: Credentials,
    /// The database client instance.
    pub db: DbClient,
    /// The LLM client instance.
    pub llm: LlmClient,
    /// The page driver instance.
    pub page: PageDriver,
}

impl Runtime {
    /// Create a new runtime instance.
    ///
    /// Fails if the credentials are missing or the browser session cannot be established.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the database, and read the credentials.
        let db = DbClient::surreal(&config).await?;
        let credentials = db.load_credentials().await?;

        // Initialize the LLM client.
        let llm = LlmClient::openai(&config, &credentials.llm_api_key);

        // Initialize the browser session.
        let page = PageDriver::webdriver(&config)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to establish the browser session: {e:#}"))?;

        Ok(Self {
            config,
            credentials,
            db,
            llm,
            page,
        })
    }

    /// The chat page URL, with the phone number filled in.
    pub fn chat_url(&self) -> String {
        self.config.chat_url.replace(PHONE_PLACEHOLDER, &self.credentials.phone_number)
    }

    /// Build a mention watcher over this runtime's services.
    pub fn watcher(&self) -> Watcher {
        Watcher::from_config(&self.config, self.page.clone(), self.llm.clone(), self.db.clone())
    }

    /// Open the chat page and watch it until cancelled.
    ///
    /// The browser session is closed on the way out, whether or not watching succeeded.
    pub async fn start(&self, cancel: CancellationToken) -> Void {
        let result = self.watch(cancel).await;

        if let Err(err) = self.page.close().await {
            warn!("Failed to close the browser session: {:#}", err);
        }

        result
    }

    #[instrument(skip_all)]
    async fn watch(&self, cancel: CancellationToken) -> Void {
        let url = self.chat_url();

        self.page
            .navigate(&url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open the chat page `{url}`: {e:#}"))?;

        println!("Please scan the QR code in the WhatsApp Web interface.");
        println!("Waiting for WhatsApp Web to load...");

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Cancelled while waiting for the chat page.");
                return Ok(());
            }
            _ = tokio::time::sleep(Duration::from_secs(self.config.login_wait_secs)) => {}
        }

        println!("Listening for @ mentions...");

        self.watcher().run(cancel).await
    }
}
