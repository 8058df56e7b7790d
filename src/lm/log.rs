//! LM invocation log.
//!
//! Every prompt sent to the text-generation service appends one line to
//! `logs/lm_log.jsonl`, so users can see what was asked and why an AI-assisted
//! result came back empty:
//!
//! ```jsonl
//! {"schema_version":1,"ts":1760000000000,"kind":"suggest_mappings","duration_ms":2100,"outcome":"success",...}
//! {"schema_version":1,"ts":1760000060000,"kind":"parse_usecase","duration_ms":900,"outcome":"unparsed",...}
//! ```
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::time::Instant;

use crate::store::WorkspacePaths;
use crate::util::truncate_string;

/// Current schema version for lm_log.jsonl entries.
pub const LM_LOG_SCHEMA_VERSION: u32 = 1;

const PROMPT_PREVIEW_BYTES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LmInvocationKind {
    ParseUsecase,
    SuggestMappings,
    InterpretResponse,
    ProbeSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LmOutcome {
    /// The answer was usable as-is.
    Success,
    /// The model answered but no structured JSON could be extracted.
    Unparsed,
    /// The call itself failed.
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmLogEntry {
    pub schema_version: u32,
    /// Unix timestamp in milliseconds when the invocation started.
    pub ts: u64,
    pub kind: LmInvocationKind,
    pub duration_ms: u64,
    pub outcome: LmOutcome,
    pub prompt_bytes: usize,
    pub response_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_preview: Option<String>,
}

/// Times one invocation and produces its log entry.
pub struct LmLogBuilder {
    start: Instant,
    ts: u64,
    kind: LmInvocationKind,
    prompt_bytes: usize,
    prompt_preview: Option<String>,
}

impl LmLogBuilder {
    pub fn new(kind: LmInvocationKind, prompt: &str) -> Self {
        Self {
            start: Instant::now(),
            ts: u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0),
            kind,
            prompt_bytes: prompt.len(),
            prompt_preview: Some(truncate_string(prompt, PROMPT_PREVIEW_BYTES)),
        }
    }

    pub fn finish(self, outcome: LmOutcome, response: Option<&str>, error: Option<String>) -> LmLogEntry {
        LmLogEntry {
            schema_version: LM_LOG_SCHEMA_VERSION,
            ts: self.ts,
            kind: self.kind,
            duration_ms: self.start.elapsed().as_millis() as u64,
            outcome,
            prompt_bytes: self.prompt_bytes,
            response_bytes: response.map(str::len).unwrap_or(0),
            error,
            prompt_preview: self.prompt_preview,
        }
    }
}

/// Append an entry; failures are reported but never abort the caller.
pub fn append_lm_log(paths: &WorkspacePaths, entry: &LmLogEntry) {
    if let Err(err) = try_append(paths, entry) {
        tracing::warn!(error = %err, "failed to append LM log entry");
    }
}

fn try_append(paths: &WorkspacePaths, entry: &LmLogEntry) -> Result<()> {
    let dir = paths.logs_dir();
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    let path = paths.lm_log_path();
    let mut line = serde_json::to_string(entry).context("serialize LM log entry")?;
    line.push('\n');
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("append {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_line_per_entry() {
        let dir = tempfile::tempdir().expect("temp dir");
        let paths = WorkspacePaths::new(dir.path().to_path_buf());
        let first = LmLogBuilder::new(LmInvocationKind::ParseUsecase, "prompt one")
            .finish(LmOutcome::Success, Some("{}"), None);
        let second = LmLogBuilder::new(LmInvocationKind::SuggestMappings, "prompt two")
            .finish(LmOutcome::Failed, None, Some("boom".to_string()));
        append_lm_log(&paths, &first);
        append_lm_log(&paths, &second);

        let text = fs::read_to_string(paths.lm_log_path()).expect("read log");
        let entries: Vec<LmLogEntry> = text
            .lines()
            .map(|line| serde_json::from_str(line).expect("parse entry"))
            .collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, LmInvocationKind::ParseUsecase);
        assert_eq!(entries[0].response_bytes, 2);
        assert_eq!(entries[1].outcome, LmOutcome::Failed);
        assert_eq!(entries[1].error.as_deref(), Some("boom"));
    }

    #[test]
    fn entries_are_stamped_with_wall_clock_millis() {
        let before = chrono::Utc::now().timestamp_millis();
        let entry = LmLogBuilder::new(LmInvocationKind::ProbeSummary, "p")
            .finish(LmOutcome::Success, Some("ok"), None);
        let after = chrono::Utc::now().timestamp_millis();
        let ts = i64::try_from(entry.ts).expect("ts fits i64");
        assert!((before..=after).contains(&ts));
    }

    #[test]
    fn prompt_preview_is_bounded() {
        let prompt = "x".repeat(2_000);
        let entry = LmLogBuilder::new(LmInvocationKind::InterpretResponse, &prompt)
            .finish(LmOutcome::Success, Some("ok"), None);
        assert_eq!(entry.prompt_bytes, 2_000);
        assert_eq!(entry.prompt_preview.map(|p| p.len()), Some(PROMPT_PREVIEW_BYTES));
    }
}
