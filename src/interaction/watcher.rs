//! The mention watcher: polls the chat page and answers `@` mentions.
//!
//! Each poll cycle is independent: read the latest message, and if it
//! contains the trigger character, extract an event from the text after the
//! first trigger, validate it, store it, and reply through the page.
//! A failed read only skips the cycle; nothing in here ends the loop except
//! cancellation.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    base::{config::Config, types::Void},
    service::{db::DbClient, llm::LlmClient, page::PageDriver},
};

use super::{
    extract::{EventExtractor, ExtractionError},
    respond::Reply,
    validate::{Verdict, validate},
};

/// Character marking a message as addressed to the bot.
pub const TRIGGER: char = '@';

/// Resolves a user identifier from the raw message text.
pub type UserIdentifier = fn(&str) -> String;

/// The text after the first trigger character, if the message contains one.
pub fn mention_text(message: &str) -> Option<&str> {
    message.split_once(TRIGGER).map(|(_, rest)| rest)
}

/// Default identifier: the page exposes no sender, so everyone is the same user.
pub fn anonymous_user(_message: &str) -> String {
    "anonymous".to_string()
}

/// CSS selectors used to read from and write to the chat page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub latest_message: String,
    pub message_input: String,
    pub send_button: String,
}

impl Selectors {
    pub fn from_config(config: &Config) -> Self {
        Self {
            latest_message: config.latest_message_selector.clone(),
            message_input: config.message_input_selector.clone(),
            send_button: config.send_button_selector.clone(),
        }
    }
}

/// What happened during a single poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The latest message could not be read.
    ReadFailed,
    /// The latest message does not mention the bot.
    NoMention,
    /// The latest message is the one already handled (dedupe only).
    Unchanged,
    /// A reply was composed and sent (or its sending was attempted).
    Replied(Reply),
}

/// Polls the chat page and replies to mentions.
pub struct Watcher {
    page: PageDriver,
    extractor: EventExtractor,
    db: DbClient,
    selectors: Selectors,
    poll_interval: Duration,
    identify_user: UserIdentifier,
    dedupe: bool,
    last_seen: Option<String>,
}

impl Watcher {
    pub fn new(page: PageDriver, extractor: EventExtractor, db: DbClient, selectors: Selectors, poll_interval: Duration) -> Self {
        Self {
            page,
            extractor,
            db,
            selectors,
            poll_interval,
            identify_user: anonymous_user,
            dedupe: false,
            last_seen: None,
        }
    }

    /// Create a watcher from the application config.
    pub fn from_config(config: &Config, page: PageDriver, llm: LlmClient, db: DbClient) -> Self {
        Self::new(
            page,
            EventExtractor::from_config(llm, config),
            db,
            Selectors::from_config(config),
            Duration::from_secs(config.poll_interval_secs),
        )
        .with_dedupe(config.dedupe_latest_message)
    }

    /// Swap the function used to identify the sender of a message.
    pub fn with_user_identifier(mut self, identify_user: UserIdentifier) -> Self {
        self.identify_user = identify_user;
        self
    }

    /// Skip cycles whose latest message is unchanged since the previous read.
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    /// Poll until cancelled, sleeping for the poll interval before each cycle.
    #[instrument(name = "Watcher::run", skip_all)]
    pub async fn run(&mut self, cancel: CancellationToken) -> Void {
        info!("Listening for {} mentions ...", TRIGGER);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            let outcome = self.poll_once().await;
            debug!("Poll cycle finished: {:?}", outcome);
        }

        info!("Stopped listening for mentions.");

        Ok(())
    }

    /// Run a single poll cycle.
    #[instrument(name = "Watcher::poll_once", skip_all)]
    pub async fn poll_once(&mut self) -> CycleOutcome {
        let message = match self.page.read_text(&self.selectors.latest_message).await {
            Ok(message) => message,
            Err(err) => {
                warn!("Failed to retrieve last message: {:#}", err);
                return CycleOutcome::ReadFailed;
            }
        };

        if self.dedupe {
            if self.last_seen.as_deref() == Some(message.as_str()) {
                return CycleOutcome::Unchanged;
            }
            self.last_seen = Some(message.clone());
        }

        let Some(candidate) = mention_text(&message) else {
            return CycleOutcome::NoMention;
        };

        info!("Received mention ...");

        let reply = self.handle_mention(&message, candidate).await;
        self.send_reply(&reply).await;

        CycleOutcome::Replied(reply)
    }

    /// Extract, validate, and store the event; decide on the reply.
    async fn handle_mention(&self, message: &str, candidate: &str) -> Reply {
        let record = match self.extractor.extract(candidate).await {
            Ok(record) => record,
            Err(ExtractionError::Call(err)) => {
                error!("Failed to call the language model: {:#}", err);
                return Reply::NotUnderstood;
            }
            Err(ExtractionError::Parse { raw, source }) => {
                error!(raw = %raw, "Failed to parse event details: {}", source);
                return Reply::NotUnderstood;
            }
        };

        if let Verdict::Incomplete { missing } = validate(&record) {
            warn!("Event is missing required fields: {}", missing.join(", "));
            return Reply::MissingFields;
        }

        let user_id = (self.identify_user)(message);

        if let Err(err) = self.db.add_event(&user_id, &record).await {
            error!("Failed to store event: {:#}", err);
            return Reply::NotStored;
        }

        info!(
            user_id = %user_id,
            title = %record.title,
            date = %record.date,
            time = %record.time,
            duration = %record.duration,
            recurrence = %record.recurrence,
            "Event noted."
        );

        Reply::Noted(record)
    }

    /// Type the reply into the message box and press send.
    async fn send_reply(&self, reply: &Reply) {
        let text = reply.text();

        if let Err(err) = self.page.send_keys(&self.selectors.message_input, &text).await {
            error!("Failed to type reply: {:#}", err);
            return;
        }

        if let Err(err) = self.page.click(&self.selectors.send_button).await {
            error!("Failed to send reply: {:#}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_text_takes_text_after_first_trigger() {
        assert_eq!(mention_text("hey @bot lunch at noon @ the cafe"), Some("bot lunch at noon @ the cafe"));
        assert_eq!(mention_text("@"), Some(""));
        assert_eq!(mention_text("trailing @"), Some(""));
    }

    #[test]
    fn test_mention_text_without_trigger() {
        assert_eq!(mention_text("lunch at noon"), None);
        assert_eq!(mention_text(""), None);
    }

    #[test]
    fn test_mention_text_handles_multibyte_text() {
        assert_eq!(mention_text("café ☕ @bot coffee"), Some("bot coffee"));
    }

    #[test]
    fn test_anonymous_user_ignores_message() {
        assert_eq!(anonymous_user("@bot lunch"), anonymous_user("anything else"));
    }
}
