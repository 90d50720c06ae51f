//! JSON-file-backed record store.
//!
//! All tables live in one JSON document of the form
//! `{"<table>": [{...}, {...}], ...}`. The whole document is rewritten after
//! every mutation. The store is an owned value with no internal locking;
//! callers that share it across tasks must serialize access themselves.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};
use thiserror::Error;

pub type Record = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store file error: {0}")]
    Io(#[from] io::Error),

    #[error("store document error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    tables: BTreeMap<String, Vec<Record>>,
}

impl JsonFileStore {
    /// Loads the document at `path`. A missing or unreadable document starts
    /// the store empty and writes the empty document back.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        match load(&path) {
            Ok(tables) => Ok(Self { path, tables }),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "starting with an empty store");
                let store = Self {
                    path,
                    tables: BTreeMap::new(),
                };
                store.persist()?;
                Ok(store)
            }
        }
    }

    /// Rows of `table`. With a non-empty `search`, keeps rows where any of
    /// the searched fields contains the searched value, ignoring case.
    pub fn select(&self, table: &str, search: Option<&Record>) -> Vec<Record> {
        let rows = self.rows(table);
        match search {
            Some(search) if !search.is_empty() => rows
                .iter()
                .filter(|row| matches_any(row, search))
                .cloned()
                .collect(),
            _ => rows.to_vec(),
        }
    }

    pub fn insert(&mut self, table: &str, row: Record) -> Result<Record, StoreError> {
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        self.persist()?;
        Ok(row)
    }

    /// Shallow-merges `data` into the row with this id.
    pub fn update(
        &mut self,
        table: &str,
        id: &str,
        data: Record,
    ) -> Result<Option<Record>, StoreError> {
        let Some(row) = self
            .tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| has_id(row, id)))
        else {
            return Ok(None);
        };

        row.extend(data);
        let updated = row.clone();
        self.persist()?;
        Ok(Some(updated))
    }

    pub fn delete(&mut self, table: &str, id: &str) -> Result<bool, StoreError> {
        let Some(rows) = self.tables.get_mut(table) else {
            return Ok(false);
        };
        let Some(index) = rows.iter().position(|row| has_id(row, id)) else {
            return Ok(false);
        };

        rows.remove(index);
        self.persist()?;
        Ok(true)
    }

    pub fn find_by_id(&self, table: &str, id: &str) -> Option<Record> {
        self.rows(table).iter().find(|row| has_id(row, id)).cloned()
    }

    fn rows(&self, table: &str) -> &[Record] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    fn persist(&self) -> Result<(), StoreError> {
        let document = serde_json::to_string_pretty(&self.tables)?;
        fs::write(&self.path, document)?;
        Ok(())
    }
}

fn load(path: &Path) -> Result<BTreeMap<String, Vec<Record>>, StoreError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn has_id(row: &Record, id: &str) -> bool {
    row.get("id").and_then(Value::as_str) == Some(id)
}

fn matches_any(row: &Record, search: &Record) -> bool {
    search.iter().any(|(key, needle)| {
        let field = row.get(key).map(stringify).unwrap_or_default();
        field.to_lowercase().contains(&stringify(needle).to_lowercase())
    })
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
