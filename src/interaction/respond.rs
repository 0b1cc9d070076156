//! User-facing reply texts.

use crate::base::types::EventRecord;

/// Recurrence shown when the model left it unspecified.
pub const DEFAULT_RECURRENCE: &str = "none";

/// A reply the bot sends back to the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The message could not be turned into an event.
    NotUnderstood,
    /// The event lacks one of the required fields.
    MissingFields,
    /// The event was accepted, but could not be stored.
    NotStored,
    /// The event was accepted.
    Noted(EventRecord),
}

impl Reply {
    /// The text to send for this reply.
    pub fn text(&self) -> String {
        match self {
            Reply::NotUnderstood => error_understanding().to_string(),
            Reply::MissingFields => error_missing_fields().to_string(),
            Reply::NotStored => error_storage().to_string(),
            Reply::Noted(record) => success(record),
        }
    }
}

pub fn error_understanding() -> &'static str {
    "Sorry, I couldn't understand the event details. Please provide all information (title, date, time, duration, recurrence) in a clear format."
}

pub fn error_missing_fields() -> &'static str {
    "Sorry, I need the event title, date, time, and duration to create the event."
}

pub fn error_storage() -> &'static str {
    "Sorry, I couldn't store the event. Please try again."
}

/// Confirmation summarising every field of the accepted event.
pub fn success(record: &EventRecord) -> String {
    let recurrence = if record.recurrence.is_empty() { DEFAULT_RECURRENCE } else { record.recurrence.as_str() };

    format!(
        "Okay, I've noted the event: {} on {} at {} for {}. Recurrence: {}",
        record.title, record.date, record.time, record.duration, recurrence
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn birthday() -> EventRecord {
        EventRecord {
            title: "Sam's Birthday".into(),
            date: "2025-03-01".into(),
            time: "14:00".into(),
            duration: "1h".into(),
            recurrence: "annually".into(),
        }
    }

    #[test]
    fn test_success_contains_every_field() {
        let text = success(&birthday());

        for value in ["Sam's Birthday", "2025-03-01", "14:00", "1h", "annually"] {
            assert!(text.contains(value), "`{text}` should contain `{value}`");
        }
    }

    #[test]
    fn test_success_defaults_empty_recurrence() {
        let mut record = birthday();
        record.recurrence = String::new();

        assert!(success(&record).ends_with("Recurrence: none"));
    }

    #[test]
    fn test_missing_fields_names_required_fields() {
        let text = error_missing_fields();

        for field in ["title", "date", "time", "duration"] {
            assert!(text.contains(field));
        }
    }

    #[test]
    fn test_understanding_asks_for_all_fields() {
        assert!(error_understanding().contains("title, date, time, duration, recurrence"));
    }

    #[test]
    fn test_reply_text_is_deterministic() {
        let reply = Reply::Noted(birthday());

        assert_eq!(reply.text(), reply.text());
        assert_eq!(reply.text(), success(&birthday()));
        assert_eq!(Reply::MissingFields.text(), error_missing_fields());
    }
}
