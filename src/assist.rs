//! AI-assisted helpers: use-case parsing, mapping suggestions and response
//! interpretation.
//!
//! Transport and credential failures propagate. A model answer without usable
//! JSON degrades to an empty result instead of an error.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lm::{
    append_lm_log, parse_json_from_text, LmInvocationKind, LmLogBuilder, LmOutcome, TextGenerator,
};
use crate::store::WorkspacePaths;
use crate::util::{render_body_for_prompt, truncate_chars};

const PARSE_USECASE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/parse_usecase.md"
));
const SUGGEST_MAPPINGS: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/suggest_mappings.md"
));
const INTERPRET_RESPONSE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/interpret_response.md"
));
const PROBE_SUMMARY: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/probe_summary.md"
));

/// Field paths per side that fit in a mapping prompt.
pub const MAX_PROMPT_FIELDS: usize = 80;
const UNPARSED_ONE_LINER_CHARS: usize = 200;
const INTERPRET_BODY_CHARS: usize = 3000;
const PROBE_BODY_CHARS: usize = 2500;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsecaseDraft {
    pub suggested_name: String,
    pub cta_system_name: Option<String>,
    pub cts_system_name: Option<String>,
    pub key_entities: Vec<String>,
    pub one_liner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedMapping {
    pub source_path: String,
    pub target_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMismatch {
    pub source_path: String,
    pub target_path: String,
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSuggestions {
    pub suggestions: Vec<SuggestedMapping>,
    pub unmapped_required: Vec<String>,
    pub type_mismatches: Vec<TypeMismatch>,
}

/// Runs prompts against a text generator and logs each invocation.
pub struct Assistant<'a> {
    generator: &'a dyn TextGenerator,
    paths: &'a WorkspacePaths,
}

impl<'a> Assistant<'a> {
    pub fn new(generator: &'a dyn TextGenerator, paths: &'a WorkspacePaths) -> Self {
        Self { generator, paths }
    }

    /// Turn a free-text use case into a scenario draft.
    pub fn parse_usecase(
        &self,
        description: &str,
        system_names: &[String],
    ) -> Result<UsecaseDraft> {
        let prompt = usecase_prompt(description, system_names);
        self.ask(LmInvocationKind::ParseUsecase, &prompt, |text| {
            match parse_json_from_text::<Value>(text) {
                Some(parsed) => (usecase_from_value(&parsed), LmOutcome::Success),
                None => (
                    UsecaseDraft {
                        one_liner: truncate_chars(text, UNPARSED_ONE_LINER_CHARS),
                        ..UsecaseDraft::default()
                    },
                    LmOutcome::Unparsed,
                ),
            }
        })
    }

    /// Propose source→target field mappings.
    pub fn suggest_mappings(
        &self,
        source_fields: &[String],
        target_fields: &[String],
    ) -> Result<MappingSuggestions> {
        let prompt = mappings_prompt(source_fields, target_fields);
        self.ask(LmInvocationKind::SuggestMappings, &prompt, |text| {
            match parse_json_from_text::<Value>(text) {
                Some(parsed) => (suggestions_from_value(&parsed), LmOutcome::Success),
                None => (MappingSuggestions::default(), LmOutcome::Unparsed),
            }
        })
    }

    /// Plain-language explanation of an HTTP response.
    pub fn interpret_response(&self, status: u16, body: &Value) -> Result<String> {
        let prompt = INTERPRET_RESPONSE
            .replace("{status}", &status.to_string())
            .replace(
                "{body}",
                &truncate_chars(&render_body_for_prompt(body), INTERPRET_BODY_CHARS),
            );
        self.ask(LmInvocationKind::InterpretResponse, &prompt, |text| {
            (text.to_string(), LmOutcome::Success)
        })
    }

    /// Short summary attached to a live probe result.
    pub fn summarize_probe(&self, status: u16, body: &Value) -> Result<String> {
        let prompt = PROBE_SUMMARY
            .trim_end()
            .replace("{status}", &status.to_string())
            .replace(
                "{body}",
                &truncate_chars(&render_body_for_prompt(body), PROBE_BODY_CHARS),
            );
        self.ask(LmInvocationKind::ProbeSummary, &prompt, |text| {
            (text.to_string(), LmOutcome::Success)
        })
    }

    fn ask<T, F>(&self, kind: LmInvocationKind, prompt: &str, interpret: F) -> Result<T>
    where
        F: FnOnce(&str) -> (T, LmOutcome),
    {
        let log = LmLogBuilder::new(kind, prompt);
        match self.generator.generate_text(prompt) {
            Ok(text) => {
                let (value, outcome) = interpret(&text);
                append_lm_log(self.paths, &log.finish(outcome, Some(&text), None));
                Ok(value)
            }
            Err(err) => {
                let entry = log.finish(LmOutcome::Failed, None, Some(format!("{err:#}")));
                append_lm_log(self.paths, &entry);
                Err(err)
            }
        }
    }
}

fn usecase_prompt(description: &str, system_names: &[String]) -> String {
    let systems_hint = if system_names.is_empty() {
        String::new()
    } else {
        format!("Known systems: {}. ", system_names.join(", "))
    };
    PARSE_USECASE
        .replace("{systems_hint}", &systems_hint)
        .replace("{description}", description.trim())
}

fn mappings_prompt(source_fields: &[String], target_fields: &[String]) -> String {
    let lines = |fields: &[String]| {
        fields
            .iter()
            .take(MAX_PROMPT_FIELDS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    };
    SUGGEST_MAPPINGS
        .replace("{source_fields}", &lines(source_fields))
        .replace("{target_fields}", &lines(target_fields))
}

fn usecase_from_value(parsed: &Value) -> UsecaseDraft {
    UsecaseDraft {
        suggested_name: string_field(parsed, "suggestedName").unwrap_or_default(),
        cta_system_name: string_field(parsed, "ctaSystemName"),
        cts_system_name: string_field(parsed, "ctsSystemName"),
        key_entities: array_field(parsed, "keyEntities")
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        one_liner: string_field(parsed, "oneLiner").unwrap_or_default(),
    }
}

fn suggestions_from_value(parsed: &Value) -> MappingSuggestions {
    MappingSuggestions {
        suggestions: typed_items(array_field(parsed, "suggestions")),
        unmapped_required: array_field(parsed, "unmappedRequired")
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        type_mismatches: typed_items(array_field(parsed, "typeMismatches")),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn array_field<'v>(value: &'v Value, key: &str) -> &'v [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

// Items that do not match the expected shape are skipped.
fn typed_items<T: serde::de::DeserializeOwned>(items: &[Value]) -> Vec<T> {
    items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

#[cfg(test)]
#[path = "assist_tests.rs"]
mod tests;
