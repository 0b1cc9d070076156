//! Prompt templates for LLM usage.

/// Placeholder in the extraction directive that is replaced by the message text.
pub const MESSAGE_PLACEHOLDER: &str = "{message}";

/// Directive asking the model to turn a chat message into a single event record.
pub const EVENT_EXTRACTION_DIRECTIVE: &str = r#####"Extract the event title, date, time, duration, and recurrence from this text: {message}.
Respond in a JSON format like this:
{"title": "event title", "date": "event date", "time": "event time", "duration": "event duration", "recurrence": "annually"}.
The recurrence can be "annually" for birthdays or anniversaries, or "none" for single day events. If any information is missing, leave the field empty.
Return _just_ the JSON object, with no other text and no code blocks."#####;

/// Build the extraction prompt for the given message text.
///
/// If the directive has no `{message}` placeholder, the message is appended
/// on its own line so it always reaches the model.
pub fn build_extraction_prompt(directive: &str, message: &str) -> String {
    if directive.contains(MESSAGE_PLACEHOLDER) {
        directive.replace(MESSAGE_PLACEHOLDER, message)
    } else {
        format!("{directive}\n\n{message}")
    }
}
