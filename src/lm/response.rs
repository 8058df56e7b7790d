use regex::Regex;
use serde::de::DeserializeOwned;

/// Best-effort JSON extraction from a model answer.
///
/// Takes everything from the first `{` to the last `}` (so prose or markdown
/// fences around the object are ignored) and parses it as `T`. Any failure
/// yields `None`.
pub fn parse_json_from_text<T: DeserializeOwned>(text: &str) -> Option<T> {
    let object = Regex::new(r"(?s)\{.*\}").ok()?;
    let found = object.find(text)?;
    serde_json::from_str(found.as_str()).ok()
}
