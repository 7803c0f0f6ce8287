//! Repository layer: the storage contracts and their interchangeable backends.
//!
//! # Responsibility
//! - Define one storage-agnostic contract for expense persistence.
//! - Provide text, CSV, JSON, SQLite and document-store backends.
//! - Define the report contract, backed by SQLite or a JSON report file.
//! - Select a backend from configuration (`open_repository`).
//!
//! # Invariants
//! - A lookup miss is `Ok(None)`, never an error.
//! - Every backend rejects `create` for an id that is already stored.
//! - Medium failures (I/O, parse, SQL) are always propagated.

pub mod csv_repo;
pub mod document_repo;
pub mod expense_repo;
pub mod file_repo;
pub mod json_repo;
pub mod report_repo;
pub mod sqlite_repo;
pub mod text_repo;

use crate::config::{BackendKind, StoreConfig};
use csv_repo::CsvExpenseRepository;
use document_repo::{DocumentExpenseRepository, MemoryCollection};
use expense_repo::{ExpenseRepository, RepoResult};
use json_repo::JsonExpenseRepository;
use log::info;
use sqlite_repo::SqliteExpenseRepository;
use text_repo::TextExpenseRepository;

/// Backend handle returned by [`open_repository`].
pub type BoxedExpenseRepository = Box<dyn ExpenseRepository + Send>;

/// Opens the backend described by `config`.
///
/// # Side effects
/// - SQLite: opens (and creates) the database file and applies migrations.
/// - File backends: nothing is touched until the first operation.
pub fn open_repository(config: &StoreConfig) -> RepoResult<BoxedExpenseRepository> {
    let path = config.resolved_path();
    info!(
        "event=repo_open module=repo status=start backend={} path={}",
        config.backend.as_str(),
        path.as_deref()
            .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string())
    );

    let repo: BoxedExpenseRepository = match (config.backend, path) {
        (BackendKind::Text, Some(path)) => Box::new(TextExpenseRepository::new(path)),
        (BackendKind::Csv, Some(path)) => Box::new(CsvExpenseRepository::new(path)),
        (BackendKind::Json, Some(path)) => Box::new(JsonExpenseRepository::new(path)),
        (BackendKind::Sqlite, Some(path)) => Box::new(SqliteExpenseRepository::open(path)?),
        (BackendKind::Sqlite, None) => Box::new(SqliteExpenseRepository::in_memory()?),
        (BackendKind::Document, _) => {
            Box::new(DocumentExpenseRepository::new(MemoryCollection::new()))
        }
        // `resolved_path` always yields a path for file backends.
        (kind, None) => {
            return Err(expense_repo::RepoError::InvalidData(format!(
                "backend `{}` requires a file path",
                kind.as_str()
            )))
        }
    };

    Ok(repo)
}
