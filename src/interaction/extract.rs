//! Structured extraction of events from free text.
//!
//! A single LLM call turns the text after an `@` mention into an
//! [`EventRecord`]. No retry happens here.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    base::{config::Config, prompts, types::EventRecord},
    service::llm::LlmClient,
};

/// Errors that can occur while extracting an event.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The language model call itself failed.
    #[error("language model call failed: {0:#}")]
    Call(anyhow::Error),

    /// The language model answered with something that is not an event record.
    #[error("language model response is not a valid event record: {source}; raw response: {raw}")]
    Parse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Turns instruction text into an [`EventRecord`] via the LLM.
#[derive(Clone)]
pub struct EventExtractor {
    llm: LlmClient,
    directive: String,
    max_tokens: u32,
}

impl EventExtractor {
    pub fn new(llm: LlmClient, directive: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            llm,
            directive: directive.into(),
            max_tokens,
        }
    }

    /// Create an extractor using the configured directive and token budget.
    pub fn from_config(llm: LlmClient, config: &Config) -> Self {
        Self::new(llm, config.extraction_directive.clone(), config.openai_max_tokens)
    }

    /// Extract an event from the given instruction text.
    #[instrument(name = "EventExtractor::extract", skip_all)]
    pub async fn extract(&self, text: &str) -> Result<EventRecord, ExtractionError> {
        let prompt = prompts::build_extraction_prompt(&self.directive, text);

        let raw = self.llm.complete(&prompt, self.max_tokens).await.map_err(ExtractionError::Call)?;
        debug!("Raw extraction response: {}", raw);

        parse_event_record(&raw)
    }
}

/// Parse a model response into an event record.
///
/// Tolerates surrounding whitespace and a wrapping markdown code fence. Keys
/// match case-insensitively, and absent keys are left empty for the validator
/// to report. Anything that is not a JSON object of strings is an error.
pub fn parse_event_record(raw: &str) -> Result<EventRecord, ExtractionError> {
    let parse_error = |source| ExtractionError::Parse { raw: raw.to_string(), source };

    let value: Value = serde_json::from_str(strip_code_fence(raw)).map_err(parse_error)?;

    serde_json::from_value(lowercase_keys(value)).map_err(parse_error)
}

fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(map.into_iter().map(|(key, value)| (key.to_lowercase(), value)).collect()),
        other => other,
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(inner) = trimmed.strip_prefix("```").and_then(|s| s.strip_suffix("```")) else {
        return trimmed;
    };

    // Drop the info string, e.g. `json`.
    let inner = inner.trim_start_matches(|c: char| c.is_ascii_alphanumeric());

    inner.trim()
}

// Tests.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use mockall::mock;

    use super::*;
    use crate::{
        base::types::Res,
        interaction::validate::{Verdict, validate},
        service::llm::GenericLlmClient,
    };

    mock! {
        pub Llm {}

        #[async_trait]
        impl GenericLlmClient for Llm {
            async fn complete(&self, prompt: &str, max_tokens: u32) -> Res<String>;
        }
    }

    fn extractor_answering(answer: Res<String>) -> EventExtractor {
        let mut mock = MockLlm::new();
        let answer = Mutex::new(Some(answer));
        mock.expect_complete().times(1).returning(move |_, _| answer.lock().unwrap().take().unwrap());

        EventExtractor::new(LlmClient::new(Arc::new(mock)), prompts::EVENT_EXTRACTION_DIRECTIVE, 250)
    }

    #[tokio::test]
    async fn test_extract_parses_full_record() {
        let extractor = extractor_answering(Ok(r#"{"title":"Sam's Birthday","date":"2025-03-01","time":"14:00","duration":"1h","recurrence":"annually"}"#.to_string()));

        let record = extractor.extract("Sam's birthday on March 1st at 2pm for an hour, every year").await.unwrap();

        assert_eq!(
            record,
            EventRecord {
                title: "Sam's Birthday".to_string(),
                date: "2025-03-01".to_string(),
                time: "14:00".to_string(),
                duration: "1h".to_string(),
                recurrence: "annually".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_extract_sends_prompt_with_text_and_budget() {
        let mut mock = MockLlm::new();
        mock.expect_complete()
            .withf(|prompt, max_tokens| prompt.contains("from this text: dinner at 7.") && *max_tokens == 123)
            .times(1)
            .returning(|_, _| Ok(r#"{"title":"Dinner","date":"","time":"19:00","duration":""}"#.to_string()));

        let extractor = EventExtractor::new(LlmClient::new(Arc::new(mock)), prompts::EVENT_EXTRACTION_DIRECTIVE, 123);

        let record = extractor.extract("dinner at 7").await.unwrap();

        assert_eq!(record.title, "Dinner");
        assert_eq!(record.recurrence, "");
    }

    #[tokio::test]
    async fn test_extract_call_failure_is_call_error() {
        let extractor = extractor_answering(Err(anyhow::anyhow!("rate limited")));

        let err = extractor.extract("lunch").await.unwrap_err();

        assert!(matches!(err, ExtractionError::Call(_)));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_extract_truncated_json_is_parse_error_with_raw_text() {
        let raw = r#"{"title":"Sam's Birthday","date":"2025-03"#;
        let extractor = extractor_answering(Ok(raw.to_string()));

        let err = extractor.extract("birthday").await.unwrap_err();

        match err {
            ExtractionError::Parse { raw: carried, .. } => assert_eq!(carried, raw),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_non_json_is_parse_error() {
        let err = parse_event_record("Sure! Here is your event.").unwrap_err();

        assert!(matches!(err, ExtractionError::Parse { ref raw, .. } if raw == "Sure! Here is your event."));
    }

    #[test]
    fn test_parse_absent_required_field_is_left_for_validation() {
        let record = parse_event_record(r#"{"title":"Party","date":"friday","time":"20:00"}"#).unwrap();

        assert_eq!(record.duration, "");
        assert_eq!(validate(&record), Verdict::Incomplete { missing: vec!["duration"] });
    }

    #[test]
    fn test_parse_matches_keys_case_insensitively() {
        let record = parse_event_record(r#"{"Title":"Party","Date":"friday","TIME":"20:00","Duration":"2h","Recurrence":"none"}"#).unwrap();

        assert_eq!(
            record,
            EventRecord {
                title: "Party".to_string(),
                date: "friday".to_string(),
                time: "20:00".to_string(),
                duration: "2h".to_string(),
                recurrence: "none".to_string(),
            }
        );
        assert_eq!(validate(&record), Verdict::Complete);
    }

    #[test]
    fn test_parse_wrong_shape_is_parse_error() {
        assert!(matches!(parse_event_record(r#"["Lunch"]"#), Err(ExtractionError::Parse { .. })));
        assert!(matches!(parse_event_record(r#"{"title":5,"date":"","time":"","duration":""}"#), Err(ExtractionError::Parse { .. })));
        assert!(matches!(parse_event_record(r#"{"Duration":["2h"]}"#), Err(ExtractionError::Parse { .. })));
        assert!(matches!(parse_event_record(r#""Lunch""#), Err(ExtractionError::Parse { .. })));
    }

    #[test]
    fn test_parse_strips_code_fence() {
        let raw = "```json\n{\"title\":\"Lunch\",\"date\":\"today\",\"time\":\"12:00\",\"duration\":\"1h\",\"recurrence\":\"none\"}\n```";

        let record = parse_event_record(raw).unwrap();

        assert_eq!(record.title, "Lunch");
        assert_eq!(record.recurrence, "none");
    }
}
