use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::Path;

use crate::error::WorkbenchError;

/// Truncate to at most `max_bytes`, never splitting a character.
pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated
}

/// Keep the first `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Render a JSON value for a prompt: strings verbatim, everything else pretty.
pub fn render_body_for_prompt(body: &Value) -> String {
    match body {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Read user input from a file, an inline argument, or stdin (in that order).
pub fn read_text_input(file: Option<&Path>, inline: Option<&str>) -> Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()));
    }
    if let Some(text) = inline {
        return Ok(text.to_string());
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("read stdin")?;
    Ok(text)
}

/// Parse user-supplied JSON, reporting malformed input as invalid with `label`.
pub fn parse_user_json(text: &str, label: &str) -> Result<Value> {
    serde_json::from_str(text)
        .map_err(|err| WorkbenchError::Invalid(format!("{label} is not valid JSON: {err}")).into())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{text}");
    Ok(())
}
