//! Core domain logic for the expense tracker.
//! This crate owns the storage contracts for expenses and reports, their
//! backends and the business rules applied on top of them.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{BackendKind, ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::expense::{Expense, ExpenseId, ExpenseValidationError};
pub use model::report::{Report, ReportId, ReportValidationError, DEFAULT_REPORT_STATUS};
pub use repo::csv_repo::{CsvCodec, CsvExpenseRepository};
pub use repo::document_repo::{
    DocumentCollection, DocumentExpenseRepository, MemoryCollection,
};
pub use repo::expense_repo::{ExpenseRepository, RepoError, RepoResult};
pub use repo::file_repo::{ExpenseCodec, FileExpenseRepository};
pub use repo::json_repo::{JsonCodec, JsonExpenseRepository};
pub use repo::report_repo::{FileReportRepository, ReportRepository};
pub use repo::sqlite_repo::SqliteExpenseRepository;
pub use repo::text_repo::{TextCodec, TextExpenseRepository};
pub use repo::{open_repository, BoxedExpenseRepository};
pub use service::expense_service::{ExpenseService, SEED_EXPENSES};
pub use service::report_service::{ReportDetails, ReportService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
