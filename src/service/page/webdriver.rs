//! W3C WebDriver implementation of the page driver.
//!
//! Speaks the WebDriver HTTP protocol directly via `reqwest`, so any
//! compliant server (chromedriver, geckodriver, selenium) can drive the
//! chat page.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use crate::base::{
    config::Config,
    types::{Res, Void},
};

use super::{GenericPageDriver, PageDriver};

/// Key under which WebDriver returns element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f97bd7c1a3f";

// Extra methods on `PageDriver` applied by the webdriver implementation.

impl PageDriver {
    /// Opens a new WebDriver session against the configured server.
    pub async fn webdriver(config: &Config) -> Res<Self> {
        let driver = WebDriverPage::connect(config).await?;
        Ok(Self { inner: Arc::new(driver) })
    }
}

// Wire types.

/// Every WebDriver response wraps its payload in `value`.
#[derive(Debug, Deserialize)]
struct WebDriverResponse {
    value: Value,
}

/// Error payload returned by WebDriver on non-success statuses.
#[derive(Debug, Deserialize)]
struct WebDriverError {
    error: String,
    #[serde(default)]
    message: String,
}

// Specific implementations.

/// WebDriver page implementation.
#[derive(Clone)]
pub struct WebDriverPage {
    http: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl WebDriverPage {
    /// Create a new browser session.
    #[instrument(name = "WebDriverPage::connect", skip_all)]
    pub async fn connect(config: &Config) -> Res<Self> {
        let http = reqwest::Client::new();
        let base_url = config.webdriver_url.trim_end_matches('/').to_string();

        let body = json!({
            "capabilities": {
                "alwaysMatch": { "browserName": config.browser_name }
            }
        });

        let value = execute(&http, Method::POST, &format!("{base_url}/session"), Some(body)).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("WebDriver did not return a session ID."))?
            .to_string();

        info!("WebDriver session `{}` established.", session_id);

        Ok(Self { http, base_url, session_id })
    }

    fn session_url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.base_url, self.session_id, path)
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Res<Value> {
        execute(&self.http, method, &self.session_url(path), body).await
    }

    /// Find the first element matching a CSS selector, returning its reference.
    async fn find_element(&self, selector: &str) -> Res<String> {
        let value = self.command(Method::POST, "/element", Some(json!({ "using": "css selector", "value": selector }))).await?;

        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("WebDriver returned no element for selector `{selector}`."))
    }
}

#[async_trait]
impl GenericPageDriver for WebDriverPage {
    #[instrument(skip(self))]
    async fn navigate(&self, url: &str) -> Void {
        self.command(Method::POST, "/url", Some(json!({ "url": url }))).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn read_text(&self, selector: &str) -> Res<String> {
        let element = self.find_element(selector).await?;
        let value = self.command(Method::GET, &format!("/element/{element}/text"), None).await?;

        value.as_str().map(str::to_string).ok_or_else(|| anyhow::anyhow!("WebDriver returned non-text content for `{selector}`."))
    }

    #[instrument(skip(self, text))]
    async fn send_keys(&self, selector: &str, text: &str) -> Void {
        let element = self.find_element(selector).await?;
        self.command(Method::POST, &format!("/element/{element}/value"), Some(json!({ "text": text }))).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn click(&self, selector: &str) -> Void {
        let element = self.find_element(selector).await?;
        self.command(Method::POST, &format!("/element/{element}/click"), Some(json!({}))).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn close(&self) -> Void {
        self.command(Method::DELETE, "", None).await?;
        info!("WebDriver session `{}` closed.", self.session_id);
        Ok(())
    }
}

/// Execute a single WebDriver command, unwrapping the `value` payload.
async fn execute(http: &reqwest::Client, method: Method, url: &str, body: Option<Value>) -> Res<Value> {
    debug!("WebDriver {} {}", method, url);

    let mut request = http.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    parse_response(status, &text)
}

/// Parse a WebDriver response body, turning error payloads into errors.
fn parse_response(status: reqwest::StatusCode, text: &str) -> Res<Value> {
    let response: WebDriverResponse = serde_json::from_str(text).map_err(|e| anyhow::anyhow!("Invalid WebDriver response ({status}): {e}: {text}"))?;

    if !status.is_success() {
        let error: WebDriverError = serde_json::from_value(response.value).unwrap_or(WebDriverError {
            error: "unknown error".to_string(),
            message: text.to_string(),
        });
        return Err(anyhow::anyhow!("WebDriver error ({status}) `{}`: {}", error.error, error.message));
    }

    Ok(response.value)
}

// Tests.
