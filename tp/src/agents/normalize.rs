//! Markdown fence normalization for model output
//!
//! Models often wrap JSON in a fenced code block even when told not to.
//! `strip_code_fences` removes one leading fence (with an optional language
//! tag) and one trailing fence, leaving unfenced text untouched apart from
//! surrounding whitespace.

use std::sync::LazyLock;

use regex::Regex;

use super::AgentError;

/// Whole-text fence: opening fence, optional language tag, body, closing fence
static FENCED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)\A```[A-Za-z0-9_+.-]*[ \t]*\r?\n?(.*?)\r?\n?[ \t]*```\z").ok());

/// Opening fence line only, for output cut off before the closing fence
static OPENING: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\A```[A-Za-z0-9_+.-]*[ \t]*\r?\n").ok());

/// Strip a surrounding markdown code fence, returning the trimmed body
pub fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();
    if !text.starts_with("```") {
        return text;
    }

    if let Some(body) = FENCED
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
    {
        return body.as_str().trim();
    }

    if let Some(m) = OPENING.as_ref().and_then(|re| re.find(text)) {
        return text[m.end()..].trim();
    }

    text
}

/// Strip fences and parse the model's answer as JSON
pub(crate) fn parse_json(raw: &str) -> Result<serde_json::Value, AgentError> {
    serde_json::from_str(strip_code_fences(raw)).map_err(|e| AgentError::Malformed(e.to_string()))
}

/// Article and name of a JSON value's type, for error messages
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
