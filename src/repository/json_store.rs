//! JSON-file record store.
//!
//! One pretty-printed JSON array per store file, loaded whole at open and
//! rewritten on every mutation. Adequate for the enrollment scales this
//! system targets; larger deployments swap in their own [`Repository`].

use super::record::SubjectRecord;
use super::{Repository, RepositoryError};
use crate::image::write_json_file;
use std::fs;
use std::path::{Path, PathBuf};

pub struct JsonStore {
    path: PathBuf,
    records: Vec<SubjectRecord>,
}

impl JsonStore {
    /// Open or create a store at `path`. Legacy v1 records are migrated in
    /// memory at load and rewritten as v2 on the next mutation.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let records = if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|e| RepositoryError::Unavailable(format!("{}: {e}", path.display())))?;
            serde_json::from_str(&raw)
                .map_err(|e| RepositoryError::Storage(format!("{}: {e}", path.display())))?
        } else {
            Vec::new()
        };
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), RepositoryError> {
        write_json_file(&self.path, &self.records).map_err(RepositoryError::Storage)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

impl Repository for JsonStore {
    fn insert(&mut self, record: SubjectRecord) -> Result<(), RepositoryError> {
        if self.position(&record.id).is_some() {
            return Err(RepositoryError::Storage(format!(
                "duplicate record id {}",
                record.id
            )));
        }
        self.records.push(record);
        self.persist()
    }

    fn get_by_id(&self, id: &str) -> Result<Option<SubjectRecord>, RepositoryError> {
        Ok(self.position(id).map(|i| self.records[i].clone()))
    }

    fn list_all(&self) -> Result<Vec<SubjectRecord>, RepositoryError> {
        Ok(self.records.clone())
    }

    fn search(&self, query: &str) -> Result<Vec<SubjectRecord>, RepositoryError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.matches_query(query))
            .cloned()
            .collect())
    }

    fn list_with_templates(&self) -> Result<Vec<SubjectRecord>, RepositoryError> {
        Ok(self
            .records
            .iter()
            .filter(|r| !r.iris_templates.is_empty())
            .cloned()
            .collect())
    }

    fn update(&mut self, record: SubjectRecord) -> Result<(), RepositoryError> {
        let index = self
            .position(&record.id)
            .ok_or_else(|| RepositoryError::NotFound(record.id.clone()))?;
        self.records[index] = record;
        self.persist()
    }

    fn delete(&mut self, id: &str) -> Result<(), RepositoryError> {
        let index = self
            .position(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        self.records.remove(index);
        self.persist()
    }
}
