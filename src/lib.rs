//! Library root for `mention-bot`.
//!
//! Mention-bot watches a chat web page for messages addressed to it with `@`,
//! and turns them into calendar events:
//! - Extracts title, date, time, duration, and recurrence with an LLM
//! - Checks that the event is complete
//! - Records accepted events and confirms them in the chat
//!
//! The bot drives the chat page through WebDriver, stores credentials and
//! events in SurrealDB, and uses OpenAI-compatible models for extraction.
//! Each of these sits behind a trait so other implementations can be swapped in.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{
    config::Config,
    types::{Res, Void},
};
use interaction::setup;
use service::{db::DbClient, llm::LlmClient};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Public async entry for the `run` command.
///
/// Sets up necessary services and starts the mention-bot runtime:
/// - Reads the credentials and opens the browser session
/// - Cancels the runtime on Ctrl-C
/// - Starts the main loop watching for mentions
pub async fn start(config: Config) -> Void {
    info!("Starting mention-bot ...");

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Cancel on Ctrl-C.
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down ...");
            shutdown.cancel();
        }
    });

    // Start the runtime.
    runtime.start(cancel).await?;

    Ok(())
}

/// Check the phone number for the `init` command.
///
/// Validates its format and that its direct-chat link is reachable, and
/// returns the link. Runs before the API key is asked for.
pub async fn check_phone_number(phone_number: &str) -> Res<String> {
    setup::validate_phone_number(phone_number)?;

    setup::check_chat_link(phone_number).await
}

/// Public async entry for the `init` command.
///
/// Checks the API key, then stores it and the phone number (already checked
/// with [`check_phone_number`]) in the credential store.
pub async fn init(config: Config, phone_number: &str, api_key: &str) -> Void {
    info!("Initializing mention-bot ...");

    let db = DbClient::surreal(&config).await?;
    let llm = LlmClient::openai(&config, api_key);

    setup::initialize(&db, &llm, phone_number, api_key).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_phone_number_rejects_bad_format_before_link_check() {
        let err = check_phone_number("+1 555 0100").await.unwrap_err();

        assert!(err.to_string().contains("only digits"));
    }
}
