//! Typed paths into a workspace layout.
use std::path::{Path, PathBuf};

/// Convenience wrapper for locating workspace files.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    root: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `config.json` path.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Return the `data/` directory holding one JSON file per table.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Return the `data/<table>.json` path.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir().join(format!("{table}.json"))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Return the `logs/lm_log.jsonl` path.
    pub fn lm_log_path(&self) -> PathBuf {
        self.logs_dir().join("lm_log.jsonl")
    }
}
