//! Core use-case services.
//!
//! # Responsibility
//! - Enforce business rules on top of any repository backend.
//! - Keep callers decoupled from storage details.

pub mod expense_service;
pub mod report_service;
