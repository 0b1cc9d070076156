//! SurrealDB implementation for mention-bot data storage.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use surrealdb::{
    Surreal,
    engine::any::{self, Any},
    opt::auth::Root,
};
use tracing::{info, instrument};

use crate::base::{
    config::Config,
    types::{EventRecord, Res, Void},
};

use super::{DbClient, GenericDbClient};

// Extra methods on `DbClient` applied by the surreal implementation.

impl DbClient {
    /// Connects to the configured SurrealDB endpoint.
    pub async fn surreal(config: &Config) -> Res<Self> {
        let client = SurrealDbClient::connect(config).await?;
        Ok(Self { inner: Arc::new(client) })
    }

    /// Creates a fresh in-memory database, mostly useful for tests.
    pub async fn surreal_memory() -> Res<Self> {
        let client = SurrealDbClient::memory().await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Records.

/// A credential in the database, keyed by its record ID.
#[derive(Debug, Serialize, Deserialize)]
struct SurrealCredential {
    value: String,
    /// Microseconds since the Unix epoch.
    updated_at: i64,
}

/// An accepted event in the database.
#[derive(Debug, Serialize, Deserialize)]
struct SurrealEvent {
    user_id: String,
    title: String,
    date: String,
    time: String,
    duration: String,
    recurrence: String,
    /// Microseconds since the Unix epoch.
    created_at: i64,
}

impl From<SurrealEvent> for EventRecord {
    fn from(event: SurrealEvent) -> Self {
        Self {
            title: event.title,
            date: event.date,
            time: event.time,
            duration: event.duration,
            recurrence: event.recurrence,
        }
    }
}

// Specific implementations.

/// SurrealDB client implementation.
#[derive(Clone)]
pub struct SurrealDbClient {
    db: Surreal<Any>,
}

impl SurrealDbClient {
    /// Connect to the configured endpoint, signing in if credentials are configured.
    #[instrument(name = "SurrealDbClient::connect", skip_all)]
    pub async fn connect(config: &Config) -> Res<Self> {
        let db = any::connect(config.db_endpoint.as_str()).await?;

        if let (Some(username), Some(password)) = (&config.db_username, &config.db_password) {
            db.signin(Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await?;
        }

        db.use_ns(&config.db_namespace).use_db(&config.db_database).await?;

        info!("Database initialized successfully.");

        Ok(Self { db })
    }

    /// Create an in-memory database.
    #[instrument(name = "SurrealDbClient::memory", skip_all)]
    pub async fn memory() -> Res<Self> {
        let db = any::connect("mem://").await?;
        db.use_ns("mention").use_db("bot").await?;

        Ok(Self { db })
    }
}

#[async_trait]
impl GenericDbClient for SurrealDbClient {
    #[instrument(skip(self))]
    async fn get_credential(&self, key: &str) -> Res<Option<String>> {
        let credential: Option<SurrealCredential> = self.db.select(("credential", key.to_string())).await?;

        Ok(credential.map(|c| c.value))
    }

    #[instrument(skip(self, value))]
    async fn set_credential(&self, key: &str, value: &str) -> Void {
        let credential = SurrealCredential {
            value: value.to_string(),
            updated_at: Utc::now().timestamp_micros(),
        };

        let _: Option<SurrealCredential> = self.db.upsert(("credential", key.to_string())).content(credential).await?;

        info!("Credential `{}` stored.", key);

        Ok(())
    }

    #[instrument(skip(self, event))]
    async fn add_event(&self, user_id: &str, event: &EventRecord) -> Void {
        let event = SurrealEvent {
            user_id: user_id.to_string(),
            title: event.title.clone(),
            date: event.date.clone(),
            time: event.time.clone(),
            duration: event.duration.clone(),
            recurrence: event.recurrence.clone(),
            created_at: Utc::now().timestamp_micros(),
        };

        let created: Option<SurrealEvent> = self.db.create("event").content(event).await?;

        if created.is_none() {
            return Err(anyhow::anyhow!("Database did not return the created event."));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_events(&self, user_id: &str) -> Res<Vec<EventRecord>> {
        let mut response = self
            .db
            .query("SELECT user_id, title, date, time, duration, recurrence, created_at FROM event WHERE user_id = $user_id ORDER BY created_at ASC")
            .bind(("user_id", user_id.to_string()))
            .await?;

        let events: Vec<SurrealEvent> = response.take(0)?;

        Ok(events.into_iter().map(EventRecord::from).collect())
    }
}

// Tests.
