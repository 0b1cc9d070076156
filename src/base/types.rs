use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// The fields that must be non-empty for an event to be accepted.
pub const REQUIRED_EVENT_FIELDS: [&str; 4] = ["title", "date", "time", "duration"];

/// A calendar event extracted from a chat message.
///
/// Every field is free-form text produced by the language model; an empty
/// string means the model could not determine it. Absent keys and `null`
/// values both deserialize to an empty string.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    #[serde_as(as = "DefaultOnNull")]
    pub title: String,
    #[serde_as(as = "DefaultOnNull")]
    pub date: String,
    #[serde_as(as = "DefaultOnNull")]
    pub time: String,
    #[serde_as(as = "DefaultOnNull")]
    pub duration: String,
    /// Usually `annually` or `none`; empty when unspecified.
    #[serde_as(as = "DefaultOnNull")]
    pub recurrence: String,
}

impl EventRecord {
    /// Names of the required fields that are empty, in declaration order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [&self.title, &self.date, &self.time, &self.duration]
            .into_iter()
            .zip(REQUIRED_EVENT_FIELDS)
            .filter(|(value, _)| value.is_empty())
            .map(|(_, name)| name)
            .collect()
    }
}

/// Credentials read from the credential store at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Destination phone number (country code, no `+`).
    pub phone_number: String,
    /// Language model API key.
    pub llm_api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("phone_number", &self.phone_number).field("llm_api_key", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_lists_empty_required_fields() {
        let record = EventRecord {
            title: "Standup".into(),
            date: "".into(),
            time: "09:00".into(),
            duration: "".into(),
            recurrence: "".into(),
        };

        assert_eq!(record.missing_fields(), vec!["date", "duration"]);
    }

    #[test]
    fn test_event_record_absent_keys_become_empty() {
        let record: EventRecord = serde_json::from_str(r#"{"title":"Party","date":"friday","time":"20:00"}"#).unwrap();

        assert_eq!(record.title, "Party");
        assert_eq!(record.duration, "");
        assert_eq!(record.missing_fields(), vec!["duration"]);
    }

    #[test]
    fn test_event_record_nulls_become_empty() {
        let record: EventRecord = serde_json::from_str(r#"{"title":"Lunch","date":null,"time":"12:00","duration":"1h","recurrence":null}"#).unwrap();

        assert_eq!(record.date, "");
        assert_eq!(record.recurrence, "");
    }

    #[test]
    fn test_event_record_recurrence_is_optional() {
        let record: EventRecord = serde_json::from_str(r#"{"title":"Lunch","date":"today","time":"12:00","duration":"1h"}"#).unwrap();

        assert_eq!(record.recurrence, "");
    }

    #[test]
    fn test_credentials_debug_redacts_key() {
        let credentials = Credentials {
            phone_number: "15551234567".into(),
            llm_api_key: "sk-secret".into(),
        };

        let debug = format!("{credentials:?}");

        assert!(debug.contains("15551234567"));
        assert!(!debug.contains("sk-secret"));
    }
}
