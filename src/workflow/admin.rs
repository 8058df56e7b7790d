//! Workspace-wide commands: init and reset.
use anyhow::Result;
use serde_json::json;

use super::WorkbenchContext;
use crate::cli::{GlobalArgs, InitArgs, ResetArgs};
use crate::config::{resolve_workspace_root, write_default_config};
use crate::error::WorkbenchError;
use crate::model::{Constraint, Endpoint, FieldFlag, FieldMapping, Project, Scenario, System};
use crate::store::{FileStore, Record, WorkspacePaths};
use crate::util::print_json;

/// Runs without loading the workspace config, so a broken file can be replaced.
pub(crate) fn run_init(global: &GlobalArgs, args: &InitArgs) -> Result<()> {
    let root = resolve_workspace_root(global.workspace.as_deref(), |key| std::env::var(key).ok())?;
    let path = write_default_config(&WorkspacePaths::new(root), args.force)?;
    println!("wrote {}", path.display());
    Ok(())
}

pub(crate) fn run_reset(ctx: &WorkbenchContext, args: &ResetArgs) -> Result<()> {
    if !args.yes {
        return Err(WorkbenchError::Invalid(
            "reset deletes every record; pass --yes to confirm".to_string(),
        )
        .into());
    }
    let removed = reset_all(&ctx.store)?;
    tracing::info!(removed, "workspace reset");
    print_json(&json!({ "ok": true, "removed": removed }))
}

/// Delete every row, dependents before the rows they reference.
pub(crate) fn reset_all(store: &FileStore) -> Result<usize> {
    Ok(clear::<FieldFlag>(store)?
        + clear::<Constraint>(store)?
        + clear::<FieldMapping>(store)?
        + clear::<Endpoint>(store)?
        + clear::<Scenario>(store)?
        + clear::<System>(store)?
        + clear::<Project>(store)?)
}

fn clear<T: Record>(store: &FileStore) -> Result<usize> {
    let removed = store.delete_where(|_: &T| true)?;
    tracing::debug!(table = T::TABLE, removed, "table cleared");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_empties_every_table() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileStore::new(WorkspacePaths::new(dir.path().to_path_buf()));
        let project = store
            .insert(Project {
                id: String::new(),
                name: "P".to_string(),
                description: None,
                created_at: String::new(),
            })
            .expect("insert project");
        store
            .insert(Scenario {
                id: String::new(),
                project_id: project.id.clone(),
                name: "S".to_string(),
                description: None,
                cta_system_id: None,
                cts_system_id: None,
                created_at: String::new(),
            })
            .expect("insert scenario");

        assert_eq!(reset_all(&store).expect("reset"), 2);
        assert!(store.list::<Project>().expect("list").is_empty());
        assert!(store.list::<Scenario>().expect("list").is_empty());
        assert_eq!(reset_all(&store).expect("reset again"), 0);
    }
}
