//! Subject store: record schema, the adapter trait, and a JSON-file
//! implementation.
//!
//! The store is an injected capability: the capture controller takes any
//! [`Repository`] and only touches it from its own task, so implementations
//! may assume serialized access.

mod json_store;
mod record;

pub use json_store::JsonStore;
pub use record::{SubjectDetails, SubjectRecord};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing store cannot be reached or read.
    #[error("repository unavailable: {0}")]
    Unavailable(String),

    /// An update or delete referenced an unknown id.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The store exists but a read or write failed.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Durable storage of enrolled subjects.
pub trait Repository {
    fn insert(&mut self, record: SubjectRecord) -> Result<(), RepositoryError>;
    fn get_by_id(&self, id: &str) -> Result<Option<SubjectRecord>, RepositoryError>;
    fn list_all(&self) -> Result<Vec<SubjectRecord>, RepositoryError>;
    /// Substring search over id, names, email and phone.
    fn search(&self, query: &str) -> Result<Vec<SubjectRecord>, RepositoryError>;
    /// Records that carry at least one template, templates included.
    fn list_with_templates(&self) -> Result<Vec<SubjectRecord>, RepositoryError>;
    fn update(&mut self, record: SubjectRecord) -> Result<(), RepositoryError>;
    fn delete(&mut self, id: &str) -> Result<(), RepositoryError>;
}
