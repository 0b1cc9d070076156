//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use crate::base::prompts;

use super::types::Res;

/// Upper bound for `openai_max_retries`.
pub const MAX_OPENAI_RETRIES: u32 = 10;

/// Default OpenAI-compatible API base.
fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Default OpenAI model to use for extraction.
fn default_openai_model() -> String {
    "gpt-4.1-mini".to_string()
}

/// Default sampling temperature for extraction.
fn default_openai_temperature() -> f32 {
    0.0
}

/// Default max output tokens for the extraction call.
fn default_openai_max_tokens() -> u32 {
    250
}

/// Default timeout for a single OpenAI call.
fn default_openai_timeout_secs() -> u64 {
    60
}

/// Default extraction directive.
fn default_extraction_directive() -> String {
    prompts::EVENT_EXTRACTION_DIRECTIVE.to_string()
}

/// Default WebDriver endpoint (chromedriver's default port).
fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

/// Default browser requested from the WebDriver server.
fn default_browser_name() -> String {
    "chrome".to_string()
}

/// Default chat URL; `{phone}` is replaced by the stored phone number.
fn default_chat_url() -> String {
    "https://web.whatsapp.com/send?phone={phone}".to_string()
}

/// Default time to wait for the QR code to be scanned.
fn default_login_wait_secs() -> u64 {
    15
}

/// Default poll interval.
fn default_poll_interval_secs() -> u64 {
    5
}

fn default_latest_message_selector() -> String {
    r#"span[dir="auto"]"#.to_string()
}

fn default_message_input_selector() -> String {
    r#"div[title="Type a message"]"#.to_string()
}

fn default_send_button_selector() -> String {
    r#"button[aria-label="Send"]"#.to_string()
}

/// Default database endpoint.
fn default_db_endpoint() -> String {
    "ws://localhost:8000".to_string()
}

fn default_db_namespace() -> String {
    "mention".to_string()
}

fn default_db_database() -> String {
    "bot".to_string()
}

/// Configuration for the mention-bot application.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// OpenAI-compatible API base (`OPENAI_API_BASE`).
    #[serde(default = "default_openai_api_base")]
    pub openai_api_base: String,
    /// Model used for extraction (`OPENAI_MODEL`).
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Sampling temperature (`OPENAI_TEMPERATURE`).
    /// Only sent to `gpt` models; value between 0 and 2.
    #[serde(default = "default_openai_temperature")]
    pub openai_temperature: f32,
    /// Max output tokens for the extraction call (`OPENAI_MAX_TOKENS`).
    #[serde(default = "default_openai_max_tokens")]
    pub openai_max_tokens: u32,
    /// Timeout for a single call, in seconds (`OPENAI_TIMEOUT_SECS`).
    #[serde(default = "default_openai_timeout_secs")]
    pub openai_timeout_secs: u64,
    /// Retries after a failed or timed out call (`OPENAI_MAX_RETRIES`).
    #[serde(default)]
    pub openai_max_retries: u32,
    /// Optional custom extraction directive to override the default (`EXTRACTION_DIRECTIVE`).
    #[serde(default = "default_extraction_directive")]
    pub extraction_directive: String,
    /// WebDriver server URL (`WEBDRIVER_URL`).
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    /// Browser requested from the WebDriver server (`BROWSER_NAME`).
    #[serde(default = "default_browser_name")]
    pub browser_name: String,
    /// Chat page to open (`CHAT_URL`).
    #[serde(default = "default_chat_url")]
    pub chat_url: String,
    /// Seconds to wait for the chat page login (`LOGIN_WAIT_SECS`).
    #[serde(default = "default_login_wait_secs")]
    pub login_wait_secs: u64,
    /// Seconds between polls of the latest message (`POLL_INTERVAL_SECS`).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// CSS selector of the latest message text (`LATEST_MESSAGE_SELECTOR`).
    #[serde(default = "default_latest_message_selector")]
    pub latest_message_selector: String,
    /// CSS selector of the message input box (`MESSAGE_INPUT_SELECTOR`).
    #[serde(default = "default_message_input_selector")]
    pub message_input_selector: String,
    /// CSS selector of the send button (`SEND_BUTTON_SELECTOR`).
    #[serde(default = "default_send_button_selector")]
    pub send_button_selector: String,
    /// Skip a poll when the latest message is unchanged since the last processed one (`DEDUPE_LATEST_MESSAGE`).
    #[serde(default)]
    pub dedupe_latest_message: bool,
    /// Database endpoint URL (`DB_ENDPOINT`), e.g. `ws://localhost:8000` or `mem://`.
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,
    /// Database username (`DB_USERNAME`); sign-in is skipped when unset.
    #[serde(default)]
    pub db_username: Option<String>,
    /// Database password (`DB_PASSWORD`).
    #[serde(default)]
    pub db_password: Option<String>,
    /// Database namespace (`DB_NAMESPACE`).
    #[serde(default = "default_db_namespace")]
    pub db_namespace: String,
    /// Database name (`DB_DATABASE`).
    #[serde(default = "default_db_database")]
    pub db_database: String,
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("MENTION_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    fn validate(&self) -> Res<()> {
        if self.openai_temperature < 0.0 || self.openai_temperature > 2.0 {
            return Err(anyhow::anyhow!("OpenAI temperature must be between 0 and 2."));
        }

        if self.openai_max_tokens < 1 || self.openai_max_tokens > 128000 {
            return Err(anyhow::anyhow!("OpenAI max tokens must be between 1 and 128000."));
        }

        if self.openai_timeout_secs == 0 {
            return Err(anyhow::anyhow!("OpenAI timeout must be at least one second."));
        }

        if self.openai_max_retries > MAX_OPENAI_RETRIES {
            return Err(anyhow::anyhow!("OpenAI max retries must be at most {MAX_OPENAI_RETRIES}."));
        }

        if self.poll_interval_secs == 0 {
            return Err(anyhow::anyhow!("Poll interval must be at least one second."));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("mention-bot-{name}-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_applies_defaults() {
        let path = write_config("defaults", "openai_model = \"gpt-4.1-nano\"\n");

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.openai_model, "gpt-4.1-nano");
        assert_eq!(config.openai_max_tokens, 250);
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.openai_max_retries, 0);
        assert!(!config.dedupe_latest_message);
        assert_eq!(config.latest_message_selector, r#"span[dir="auto"]"#);
        assert_eq!(config.extraction_directive, prompts::EVENT_EXTRACTION_DIRECTIVE);
        assert!(config.db_username.is_none());
    }

    #[test]
    fn test_load_rejects_bad_temperature() {
        let path = write_config("temperature", "openai_temperature = 3.5\n");

        let result = Config::load(Some(&path));

        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_unbounded_retries() {
        let path = write_config("retries", "openai_max_retries = 60\n");

        let result = Config::load(Some(&path));

        assert!(result.unwrap_err().to_string().contains("max retries"));
    }

    #[test]
    fn test_load_rejects_zero_poll_interval() {
        let path = write_config("poll", "poll_interval_secs = 0\n");

        let result = Config::load(Some(&path));

        assert!(result.unwrap_err().to_string().contains("Poll interval"));
    }
}
