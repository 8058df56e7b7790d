use anyhow::Result;
use serde_json::Value;

use super::WorkbenchContext;
use crate::cli::{
    AddConstraintArgs, ScenarioCommand, ScenarioCreateArgs, ScenarioUpdateArgs, SetMappingsArgs,
};
use crate::error::WorkbenchError;
use crate::model::{
    non_blank, required, Constraint, EvidenceSource, FieldMapping, Project, Scenario,
    ScenarioWithMappings,
};
use crate::store::newest_first;
use crate::util::{parse_user_json, print_json, read_text_input};
use crate::verdict::evaluate_verdict;

pub(crate) fn run_scenario(ctx: &WorkbenchContext, command: &ScenarioCommand) -> Result<()> {
    match command {
        ScenarioCommand::List(args) => print_json(&list_scenarios(ctx, &args.project)?),
        ScenarioCommand::Create(args) => print_json(&create_scenario(ctx, args)?),
        ScenarioCommand::Show(args) => {
            let scenario = ctx.store.require::<Scenario>(&args.id, "Scenario")?;
            print_json(&ctx.with_mappings(scenario)?)
        }
        ScenarioCommand::Update(args) => print_json(&update_scenario(ctx, args)?),
        ScenarioCommand::Mappings(args) => {
            ctx.store.require::<Scenario>(&args.id, "Scenario")?;
            print_json(&ctx.mappings_for(&args.id)?)
        }
        ScenarioCommand::SetMappings(args) => print_json(&set_mappings(ctx, args)?),
        ScenarioCommand::Constraints(args) => {
            ctx.store.require::<Scenario>(&args.id, "Scenario")?;
            print_json(&constraints_for(ctx, &args.id)?)
        }
        ScenarioCommand::AddConstraint(args) => print_json(&add_constraint(ctx, args)?),
        ScenarioCommand::Verdict(args) => {
            ctx.store.require::<Scenario>(&args.id, "Scenario")?;
            let result = evaluate_verdict(&constraints_for(ctx, &args.id)?);
            tracing::debug!(
                constraints = result.evidence.total(),
                verdict = %result.verdict,
                confidence = %result.confidence,
                "verdict evaluated"
            );
            print_json(&result)
        }
    }
}

fn list_scenarios(ctx: &WorkbenchContext, project_id: &str) -> Result<Vec<ScenarioWithMappings>> {
    let scenarios = ctx
        .store
        .find::<Scenario, _>(|scenario| scenario.project_id == project_id)?;
    newest_first(scenarios)
        .into_iter()
        .map(|scenario| ctx.with_mappings(scenario))
        .collect()
}

fn create_scenario(ctx: &WorkbenchContext, args: &ScenarioCreateArgs) -> Result<Scenario> {
    let name = required(args.name.as_deref(), "project_id and name are required")?;
    ctx.store.require::<Project>(&args.project, "Project")?;
    let row = Scenario {
        id: String::new(),
        project_id: args.project.clone(),
        name,
        description: non_blank(args.description.as_deref()),
        cta_system_id: non_blank(args.cta.as_deref()),
        cts_system_id: non_blank(args.cts.as_deref()),
        created_at: String::new(),
    };
    let scenario = ctx.store.insert(row)?;
    tracing::info!(scenario_id = %scenario.id, project_id = %scenario.project_id, "scenario created");
    Ok(scenario)
}

fn update_scenario(ctx: &WorkbenchContext, args: &ScenarioUpdateArgs) -> Result<Scenario> {
    let name = args
        .name
        .as_deref()
        .map(|name| required(Some(name), "name must not be blank"))
        .transpose()?;
    let updated = ctx.store.update::<Scenario, _>(&args.id, |scenario| {
        if let Some(name) = name {
            scenario.name = name;
        }
        if let Some(description) = args.description.as_deref() {
            scenario.description = non_blank(Some(description));
        }
        if let Some(cta) = args.cta.as_deref() {
            scenario.cta_system_id = non_blank(Some(cta));
        }
        if let Some(cts) = args.cts.as_deref() {
            scenario.cts_system_id = non_blank(Some(cts));
        }
    })?;
    updated.ok_or_else(|| WorkbenchError::not_found("Scenario").into())
}

/// Mapping rows as submitted: `source_path`, `target_path`, `transform_notes`.
pub(crate) struct MappingInput {
    pub(crate) source_path: String,
    pub(crate) target_path: String,
    pub(crate) transform_notes: Option<String>,
}

/// Accept a bare array or `{"mappings": [...]}`; rows without both paths are dropped.
fn parse_mapping_inputs(value: &Value) -> Result<Vec<MappingInput>, WorkbenchError> {
    let items = value
        .get("mappings")
        .unwrap_or(value)
        .as_array()
        .ok_or_else(|| WorkbenchError::Invalid("mappings must be an array".to_string()))?;
    Ok(items
        .iter()
        .filter_map(|item| {
            let text = |key: &str| non_blank(item.get(key).and_then(Value::as_str));
            Some(MappingInput {
                source_path: text("source_path")?,
                target_path: text("target_path")?,
                transform_notes: text("transform_notes"),
            })
        })
        .collect())
}

fn set_mappings(ctx: &WorkbenchContext, args: &SetMappingsArgs) -> Result<Vec<FieldMapping>> {
    ctx.store.require::<Scenario>(&args.id, "Scenario")?;
    let text = read_text_input(args.file.as_deref(), None)?;
    let value = parse_user_json(&text, "mappings")?;
    let inputs = parse_mapping_inputs(&value)?;
    replace_mappings(ctx, &args.id, inputs)
}

/// Drop every mapping of the scenario and insert `inputs` in their place.
pub(crate) fn replace_mappings(
    ctx: &WorkbenchContext,
    scenario_id: &str,
    inputs: Vec<MappingInput>,
) -> Result<Vec<FieldMapping>> {
    let removed = ctx
        .store
        .delete_where(|mapping: &FieldMapping| mapping.scenario_id == scenario_id)?;
    let rows: Vec<FieldMapping> = inputs
        .into_iter()
        .map(|input| FieldMapping {
            id: String::new(),
            scenario_id: scenario_id.to_string(),
            source_path: input.source_path,
            target_path: input.target_path,
            transform_notes: input.transform_notes,
            created_at: String::new(),
        })
        .collect();
    let inserted = ctx.store.insert_many(rows)?;
    tracing::info!(scenario_id, removed, inserted = inserted.len(), "mappings replaced");
    Ok(inserted)
}

fn constraints_for(ctx: &WorkbenchContext, scenario_id: &str) -> Result<Vec<Constraint>> {
    let rows = ctx
        .store
        .find::<Constraint, _>(|constraint| constraint.scenario_id == scenario_id)?;
    Ok(newest_first(rows))
}

fn add_constraint(ctx: &WorkbenchContext, args: &AddConstraintArgs) -> Result<Constraint> {
    let description = required(args.description.as_deref(), "description and source required")?;
    let source: EvidenceSource = args.source.parse()?;
    ctx.store.require::<Scenario>(&args.id, "Scenario")?;
    let row = Constraint {
        id: String::new(),
        scenario_id: args.id.clone(),
        description,
        category: non_blank(args.category.as_deref()),
        source,
        created_at: String::new(),
    };
    let constraint = ctx.store.insert(row)?;
    tracing::info!(scenario_id = %args.id, source = %constraint.source, "constraint recorded");
    Ok(constraint)
}
