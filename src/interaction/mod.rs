//! Mention handling and user interactions for mention-bot.
//!
//! This module provides the pipeline from a chat message to a reply:
//! - Watching the chat page for `@` mentions
//! - Extracting structured events with the LLM
//! - Validating events and composing replies
//! - First-run credential setup

pub mod extract;
pub mod respond;
pub mod setup;
pub mod validate;
pub mod watcher;
