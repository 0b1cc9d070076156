pub mod webdriver;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{Res, Void};

// Traits.

/// Generic "page driver" trait that clients must implement.
///
/// This trait defines the minimal browser automation the bot needs to read
/// from and write to a chat web page. All selectors are CSS selectors, and
/// the first matching element is used.
#[async_trait]
pub trait GenericPageDriver: Send + Sync + 'static {
    /// Navigate the browser to the given URL.
    async fn navigate(&self, url: &str) -> Void;

    /// Read the visible text of the element matching the selector.
    async fn read_text(&self, selector: &str) -> Res<String>;

    /// Type text into the element matching the selector.
    async fn send_keys(&self, selector: &str, text: &str) -> Void;

    /// Click the element matching the selector.
    async fn click(&self, selector: &str) -> Void;

    /// Close the browser session.
    async fn close(&self) -> Void {
        Ok(())
    }
}

// Structs.

/// Page driver for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct PageDriver {
    inner: Arc<dyn GenericPageDriver>,
}

impl Deref for PageDriver {
    type Target = dyn GenericPageDriver;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl PageDriver {
    pub fn new(inner: Arc<dyn GenericPageDriver>) -> Self {
        Self { inner }
    }
}
