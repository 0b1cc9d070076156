//! Completeness check for extracted events.

use crate::base::types::EventRecord;

/// The outcome of validating an [`EventRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Title, date, time, and duration are all present.
    Complete,
    /// At least one required field is empty.
    Incomplete { missing: Vec<&'static str> },
}

/// Check a record for completeness.
///
/// Recurrence is never required.
pub fn validate(record: &EventRecord) -> Verdict {
    let missing = record.missing_fields();

    if missing.is_empty() { Verdict::Complete } else { Verdict::Incomplete { missing } }
}
