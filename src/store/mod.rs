//! File-backed record store for a workspace.
//!
//! Each table is a JSON array under `data/<table>.json`. Every mutation rewrites
//! the table through a temp file in the same directory followed by a rename, so
//! a crash never leaves a half-written table behind.
mod paths;

pub use paths::WorkspacePaths;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;

use crate::error::WorkbenchError;

/// A row type persisted in its own table.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const TABLE: &'static str;

    fn id(&self) -> &str;

    fn created_at(&self) -> &str;

    /// Stamp a freshly inserted row with its key and creation time.
    fn assign_identity(&mut self, id: String, created_at: String);
}

/// Keyed CRUD over the workspace tables.
#[derive(Debug, Clone)]
pub struct FileStore {
    paths: WorkspacePaths,
}

impl FileStore {
    pub fn new(paths: WorkspacePaths) -> Self {
        Self { paths }
    }

    /// Load every row of a table in stored (insertion) order.
    pub fn list<T: Record>(&self) -> Result<Vec<T>> {
        let path = self.paths.table_path(T::TABLE);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
        let rows: Vec<T> = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse table {}", T::TABLE))?;
        Ok(rows)
    }

    /// Rows matching `pred`, in stored order.
    pub fn find<T, F>(&self, pred: F) -> Result<Vec<T>>
    where
        T: Record,
        F: Fn(&T) -> bool,
    {
        Ok(self.list::<T>()?.into_iter().filter(|row| pred(row)).collect())
    }

    pub fn get<T: Record>(&self, id: &str) -> Result<Option<T>> {
        Ok(self.list::<T>()?.into_iter().find(|row| row.id() == id))
    }

    /// Like [`FileStore::get`], but a missing row is a `NotFound` error
    /// labelled with `what` (e.g. "Project").
    pub fn require<T: Record>(&self, id: &str, what: &str) -> Result<T> {
        self.get(id)?
            .ok_or_else(|| WorkbenchError::not_found(what).into())
    }

    pub fn insert<T: Record>(&self, row: T) -> Result<T> {
        let mut inserted = self.insert_many(vec![row])?;
        inserted
            .pop()
            .context("insert returned no row")
    }

    pub fn insert_many<T: Record>(&self, rows: Vec<T>) -> Result<Vec<T>> {
        if rows.is_empty() {
            return Ok(rows);
        }
        let mut table = self.list::<T>()?;
        let created_at = now_timestamp();
        let inserted: Vec<T> = rows
            .into_iter()
            .map(|mut row| {
                row.assign_identity(new_id(), created_at.clone());
                row
            })
            .collect();
        table.extend(inserted.iter().cloned());
        self.write_table(&table)?;
        Ok(inserted)
    }

    /// Apply `patch` to the row with `id`; `None` when no such row exists.
    pub fn update<T, F>(&self, id: &str, patch: F) -> Result<Option<T>>
    where
        T: Record,
        F: FnOnce(&mut T),
    {
        let mut table = self.list::<T>()?;
        let Some(row) = table.iter_mut().find(|row| row.id() == id) else {
            return Ok(None);
        };
        patch(row);
        let updated = row.clone();
        self.write_table(&table)?;
        Ok(Some(updated))
    }

    /// Replace the row that shares `row`'s unique key, keeping its identity,
    /// or insert `row` when there is none.
    pub fn upsert_by<T, F>(&self, mut row: T, same_key: F) -> Result<T>
    where
        T: Record,
        F: Fn(&T) -> bool,
    {
        let mut table = self.list::<T>()?;
        match table.iter().position(|existing| same_key(existing)) {
            Some(index) => {
                let existing = &table[index];
                row.assign_identity(existing.id().to_string(), existing.created_at().to_string());
                table[index] = row.clone();
            }
            None => {
                row.assign_identity(new_id(), now_timestamp());
                table.push(row.clone());
            }
        }
        self.write_table(&table)?;
        Ok(row)
    }

    /// Delete rows matching `pred`, returning how many were removed.
    pub fn delete_where<T, F>(&self, pred: F) -> Result<usize>
    where
        T: Record,
        F: Fn(&T) -> bool,
    {
        let table = self.list::<T>()?;
        let before = table.len();
        let kept: Vec<T> = table.into_iter().filter(|row| !pred(row)).collect();
        let removed = before - kept.len();
        if removed > 0 {
            self.write_table(&kept)?;
        }
        Ok(removed)
    }

    fn write_table<T: Record>(&self, rows: &[T]) -> Result<()> {
        let dir = self.paths.data_dir();
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        let path = self.paths.table_path(T::TABLE);
        let json = serde_json::to_vec_pretty(rows)
            .with_context(|| format!("serialize table {}", T::TABLE))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("create temp file in {}", dir.display()))?;
        tmp.write_all(&json)
            .with_context(|| format!("write {}", path.display()))?;
        tmp.persist(&path)
            .map_err(|err| err.error)
            .with_context(|| format!("publish {}", path.display()))?;
        tracing::debug!(table = T::TABLE, rows = rows.len(), "table written");
        Ok(())
    }
}

/// Order rows newest first; rows created in the same instant keep reverse
/// insertion order.
pub fn newest_first<T: Record>(mut rows: Vec<T>) -> Vec<T> {
    rows.reverse();
    rows.sort_by(|a, b| b.created_at().cmp(a.created_at()));
    rows
}

/// Order rows oldest first, keeping insertion order for ties.
pub fn oldest_first<T: Record>(mut rows: Vec<T>) -> Vec<T> {
    rows.sort_by(|a, b| a.created_at().cmp(b.created_at()));
    rows
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
