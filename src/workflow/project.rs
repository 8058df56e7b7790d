use anyhow::{Context, Result};
use std::fs;

use super::WorkbenchContext;
use crate::cli::{ProjectCommand, ProjectCreateArgs, ProjectSpecArgs};
use crate::model::{non_blank, required, Constraint, Project, Scenario, System};
use crate::spec_doc::{referenced_system_ids, render_project_spec, UseCase};
use crate::store::newest_first;
use crate::util::print_json;
use crate::verdict::evaluate_verdict;

pub(crate) fn run_project(ctx: &WorkbenchContext, command: &ProjectCommand) -> Result<()> {
    match command {
        ProjectCommand::List => print_json(&newest_first(ctx.store.list::<Project>()?)),
        ProjectCommand::Create(args) => print_json(&create_project(ctx, args)?),
        ProjectCommand::Show(args) => print_json(&ctx.store.require::<Project>(&args.id, "Project")?),
        ProjectCommand::Spec(args) => write_spec(ctx, args),
    }
}

fn create_project(ctx: &WorkbenchContext, args: &ProjectCreateArgs) -> Result<Project> {
    let row = Project {
        id: String::new(),
        name: required(args.name.as_deref(), "name is required")?,
        description: non_blank(args.description.as_deref()),
        created_at: String::new(),
    };
    let project = ctx.store.insert(row)?;
    tracing::info!(project_id = %project.id, "project created");
    Ok(project)
}

fn write_spec(ctx: &WorkbenchContext, args: &ProjectSpecArgs) -> Result<()> {
    let markdown = project_spec_markdown(ctx, &args.id)?;
    match &args.out {
        Some(path) => {
            fs::write(path, markdown.as_bytes())
                .with_context(|| format!("write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        None => print!("{markdown}"),
    }
    Ok(())
}

/// Assemble the project's spec document from the store.
pub(crate) fn project_spec_markdown(ctx: &WorkbenchContext, project_id: &str) -> Result<String> {
    let project = ctx.store.require::<Project>(project_id, "Project")?;
    let scenarios = newest_first(
        ctx.store
            .find::<Scenario, _>(|scenario| scenario.project_id == project.id)?,
    );

    let all_systems = ctx.store.list::<System>()?;
    let systems: Vec<System> = referenced_system_ids(&scenarios)
        .iter()
        .filter_map(|id| all_systems.iter().find(|system| &system.id == id).cloned())
        .collect();

    let constraints = ctx.store.list::<Constraint>()?;
    let mut mappings = Vec::with_capacity(scenarios.len());
    for scenario in &scenarios {
        mappings.push(ctx.mappings_for(&scenario.id)?);
    }
    let use_cases: Vec<UseCase<'_>> = scenarios
        .iter()
        .zip(&mappings)
        .map(|(scenario, mappings)| {
            let own: Vec<Constraint> = constraints
                .iter()
                .filter(|constraint| constraint.scenario_id == scenario.id)
                .cloned()
                .collect();
            UseCase {
                scenario,
                mappings,
                verdict: (!own.is_empty()).then(|| evaluate_verdict(&own)),
            }
        })
        .collect();

    Ok(render_project_spec(&project, &use_cases, &systems))
}
