use anyhow::Result;
use serde_json::Value;

use crate::cli::GlobalArgs;
use crate::config::WorkbenchConfig;
use crate::lm::{client_for, TextGenerator};
use crate::model::{Endpoint, FieldMapping, Scenario, ScenarioWithMappings, DISCOVERY_METHOD, DISCOVERY_PATH};
use crate::store::{oldest_first, FileStore, WorkspacePaths};

/// Resolved configuration plus the store, shared by every command.
pub(crate) struct WorkbenchContext {
    pub(crate) config: WorkbenchConfig,
    pub(crate) store: FileStore,
}

impl WorkbenchContext {
    pub(crate) fn load(global: &GlobalArgs) -> Result<Self> {
        let config = WorkbenchConfig::load(global.workspace.as_deref(), global.lm.as_deref())?;
        let store = FileStore::new(config.paths.clone());
        tracing::debug!(workspace = %config.paths.root().display(), "workspace loaded");
        Ok(Self { config, store })
    }

    pub(crate) fn paths(&self) -> &WorkspacePaths {
        &self.config.paths
    }

    pub(crate) fn generator(&self, model: Option<&str>) -> Box<dyn TextGenerator> {
        client_for(&self.config, model)
    }

    /// The system's stored discovery sample, if any.
    pub(crate) fn discovery_sample(&self, system_id: &str) -> Result<Option<Value>> {
        let endpoint = self
            .store
            .find::<Endpoint, _>(|endpoint| endpoint.is_discovery_for(system_id))?
            .into_iter()
            .next();
        Ok(endpoint
            .map(|endpoint| endpoint.response_schema)
            .filter(|sample| !sample.is_null()))
    }

    /// Store `sample` on the system's sentinel discovery endpoint.
    pub(crate) fn store_discovery_sample(&self, system_id: &str, sample: Value) -> Result<Endpoint> {
        let row = Endpoint {
            id: String::new(),
            system_id: system_id.to_string(),
            method: DISCOVERY_METHOD.to_string(),
            path: DISCOVERY_PATH.to_string(),
            response_schema: sample,
            created_at: String::new(),
        };
        self.store
            .upsert_by(row, |existing: &Endpoint| existing.is_discovery_for(system_id))
    }

    /// Mappings of one scenario, oldest first.
    pub(crate) fn mappings_for(&self, scenario_id: &str) -> Result<Vec<FieldMapping>> {
        let rows = self
            .store
            .find::<FieldMapping, _>(|mapping| mapping.scenario_id == scenario_id)?;
        Ok(oldest_first(rows))
    }

    pub(crate) fn with_mappings(&self, scenario: Scenario) -> Result<ScenarioWithMappings> {
        let field_mappings = self.mappings_for(&scenario.id)?;
        Ok(ScenarioWithMappings {
            scenario,
            field_mappings,
        })
    }
}
