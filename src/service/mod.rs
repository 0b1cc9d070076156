//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for various services used by the mention-bot:
//! - Page drivers for the chat web surface (e.g., WebDriver)
//! - Database services for credentials and events (e.g., SurrealDB)
//! - LLM services (e.g., OpenAI)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod db;
pub mod llm;
pub mod page;
