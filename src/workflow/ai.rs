use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use super::scenario::{replace_mappings, MappingInput};
use super::WorkbenchContext;
use crate::assist::{Assistant, MappingSuggestions};
use crate::cli::{AiCommand, InterpretArgs, ParseUsecaseArgs, SuggestMappingsArgs};
use crate::discovery::{extract_fields, field_paths};
use crate::error::WorkbenchError;
use crate::model::{non_blank, Scenario};
use crate::util::print_json;

pub(crate) fn run_ai(ctx: &WorkbenchContext, command: &AiCommand) -> Result<()> {
    match command {
        AiCommand::ParseUsecase(args) => parse_usecase(ctx, args),
        AiCommand::SuggestMappings(args) => suggest_mappings(ctx, args),
        AiCommand::Interpret(args) => interpret(ctx, args),
    }
}

fn parse_usecase(ctx: &WorkbenchContext, args: &ParseUsecaseArgs) -> Result<()> {
    let description = non_blank(args.description.as_deref())
        .ok_or_else(|| WorkbenchError::Invalid("description is required".to_string()))?;
    let generator = ctx.generator(args.model.as_deref());
    let assistant = Assistant::new(generator.as_ref(), ctx.paths());
    let draft = assistant.parse_usecase(&description, &args.systems)?;
    print_json(&draft)
}

fn suggest_mappings(ctx: &WorkbenchContext, args: &SuggestMappingsArgs) -> Result<()> {
    let (source_fields, target_fields) = match (&args.scenario, &args.source_fields, &args.target_fields) {
        (Some(scenario_id), _, _) => scenario_field_paths(ctx, scenario_id)?,
        (None, Some(source), Some(target)) => (read_field_list(source)?, read_field_list(target)?),
        _ => {
            return Err(WorkbenchError::Invalid(
                "provide --scenario or both --source-fields and --target-fields".to_string(),
            )
            .into())
        }
    };

    let generator = ctx.generator(args.model.as_deref());
    let assistant = Assistant::new(generator.as_ref(), ctx.paths());
    let suggestions = assistant.suggest_mappings(&source_fields, &target_fields)?;

    match (&args.scenario, args.apply) {
        (Some(scenario_id), true) => {
            let inputs = mapping_inputs(&suggestions);
            if inputs.is_empty() {
                return Err(WorkbenchError::Invalid(
                    "no suggestions to apply; existing mappings left unchanged".to_string(),
                )
                .into());
            }
            let applied = replace_mappings(ctx, scenario_id, inputs)?;
            print_json(&json!({ "suggestions": suggestions, "applied": applied }))
        }
        _ => print_json(&suggestions),
    }
}

/// Field paths of the scenario's CTA and CTS discovery samples; a side with
/// no system or no sample contributes nothing.
fn scenario_field_paths(ctx: &WorkbenchContext, scenario_id: &str) -> Result<(Vec<String>, Vec<String>)> {
    let scenario = ctx.store.require::<Scenario>(scenario_id, "Scenario")?;
    let paths_for = |system_id: &Option<String>| -> Result<Vec<String>> {
        let Some(system_id) = system_id.as_deref() else {
            return Ok(Vec::new());
        };
        Ok(ctx
            .discovery_sample(system_id)?
            .map(|sample| field_paths(&extract_fields(&sample)))
            .unwrap_or_default())
    };
    Ok((
        paths_for(&scenario.cta_system_id)?,
        paths_for(&scenario.cts_system_id)?,
    ))
}

fn read_field_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn mapping_inputs(suggestions: &MappingSuggestions) -> Vec<MappingInput> {
    suggestions
        .suggestions
        .iter()
        .filter_map(|suggestion| {
            Some(MappingInput {
                source_path: non_blank(Some(suggestion.source_path.as_str()))?,
                target_path: non_blank(Some(suggestion.target_path.as_str()))?,
                transform_notes: None,
            })
        })
        .collect()
}

fn interpret(ctx: &WorkbenchContext, args: &InterpretArgs) -> Result<()> {
    let body = serde_json::from_str::<Value>(&args.body)
        .unwrap_or_else(|_| Value::String(args.body.clone()));
    let generator = ctx.generator(args.model.as_deref());
    let assistant = Assistant::new(generator.as_ref(), ctx.paths());
    let summary = assistant.interpret_response(args.status, &body)?;
    print_json(&json!({ "summary": summary }))
}
