//! First-run setup: validate and store the credentials the bot runs with.

use tracing::{info, instrument};

use crate::{
    base::types::{Credentials, Res, Void},
    service::{db::DbClient, llm::LlmClient},
};

/// Base of the public direct-chat link for a phone number.
pub const CHAT_LINK_BASE: &str = "https://wa.me";

/// Check that a phone number is a bare international number.
///
/// Expected form: country code and number, digits only, no `+` or leading zeros.
pub fn validate_phone_number(phone_number: &str) -> Void {
    if phone_number.is_empty() {
        return Err(anyhow::anyhow!("Phone number must not be empty."));
    }

    if !phone_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(anyhow::anyhow!("Phone number must contain only digits (no `+`, spaces, or dashes)."));
    }

    if phone_number.starts_with('0') {
        return Err(anyhow::anyhow!("Phone number must start with the country code, without leading zeros."));
    }

    Ok(())
}

/// The direct-chat link for a phone number.
pub fn chat_link(phone_number: &str) -> String {
    format!("{CHAT_LINK_BASE}/{phone_number}")
}

/// Check that the direct-chat link for the phone number is reachable.
#[instrument(skip_all)]
pub async fn check_chat_link(phone_number: &str) -> Res<String> {
    let link = chat_link(phone_number);

    let response = reqwest::Client::new()
        .head(&link)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to check chat link `{link}`: {e}"))?;

    if !response.status().is_success() {
        return Err(anyhow::anyhow!("Chat link `{link}` is not reachable. Status code: {}", response.status()));
    }

    info!("Chat link `{}` is reachable.", link);

    Ok(link)
}

/// Check that the LLM accepts the API key with a tiny request.
#[instrument(skip_all)]
pub async fn validate_api_key(llm: &LlmClient) -> Void {
    llm.complete("Hello", 10).await.map_err(|e| anyhow::anyhow!("Failed to validate the language model API key: {e:#}"))?;

    info!("Language model API key is valid.");

    Ok(())
}

/// Validate both credentials, then store them.
///
/// Nothing is stored unless both are valid. `llm` must be built from `api_key`.
#[instrument(skip_all)]
pub async fn initialize(db: &DbClient, llm: &LlmClient, phone_number: &str, api_key: &str) -> Void {
    validate_phone_number(phone_number)?;
    validate_api_key(llm).await?;

    db.store_credentials(&Credentials {
        phone_number: phone_number.to_string(),
        llm_api_key: api_key.to_string(),
    })
    .await?;

    info!("Credentials stored.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use mockall::mock;

    use super::*;
    use crate::service::{
        db::{LLM_API_KEY_KEY, PHONE_NUMBER_KEY},
        llm::GenericLlmClient,
    };

    mock! {
        pub Llm {}

        #[async_trait]
        impl GenericLlmClient for Llm {
            async fn complete(&self, prompt: &str, max_tokens: u32) -> Res<String>;
        }
    }

    fn llm_returning(ok: bool) -> LlmClient {
        let mut mock = MockLlm::new();
        mock.expect_complete().withf(|_, max_tokens| *max_tokens == 10).times(1).returning(move |_, _| {
            if ok { Ok("Hi!".to_string()) } else { Err(anyhow::anyhow!("invalid api key")) }
        });

        LlmClient::new(Arc::new(mock))
    }

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("15551234567").is_ok());
        assert!(validate_phone_number("").is_err());
        assert!(validate_phone_number("+15551234567").is_err());
        assert!(validate_phone_number("555-1234").is_err());
        assert!(validate_phone_number("0015551234567").is_err());
    }

    #[test]
    fn test_chat_link() {
        assert_eq!(chat_link("15551234567"), "https://wa.me/15551234567");
    }

    #[tokio::test]
    async fn test_initialize_stores_credentials() {
        let db = DbClient::surreal_memory().await.unwrap();

        initialize(&db, &llm_returning(true), "15551234567", "sk-test").await.unwrap();

        let credentials = db.load_credentials().await.unwrap();
        assert_eq!(credentials.phone_number, "15551234567");
        assert_eq!(credentials.llm_api_key, "sk-test");
    }

    #[tokio::test]
    async fn test_initialize_rejected_key_stores_nothing() {
        let db = DbClient::surreal_memory().await.unwrap();

        let err = initialize(&db, &llm_returning(false), "15551234567", "sk-bad").await.unwrap_err();

        assert!(err.to_string().contains("invalid api key"));
        assert_eq!(db.get_credential(PHONE_NUMBER_KEY).await.unwrap(), None);
        assert_eq!(db.get_credential(LLM_API_KEY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_initialize_rejects_bad_phone_before_calling_llm() {
        let db = DbClient::surreal_memory().await.unwrap();
        let llm = LlmClient::new(Arc::new(MockLlm::new()));

        let result = initialize(&db, &llm, "+1 555", "sk-test").await;

        assert!(result.is_err());
    }
}
