//! Report use-case service.
//!
//! # Responsibility
//! - CRUD for reports with the same existence rules as expenses.
//! - File expenses under reports and resolve a report's expenses.
//!
//! # Invariants
//! - Creating an existing report id returns `Ok(None)` and performs no write.
//! - Updating or deleting a missing report returns `Ok(false)`.
//! - Linking checks both the report and the expense before writing.
//! - Stale membership ids (the expense was deleted since) are skipped when a
//!   report is resolved, never reported as errors.

use crate::model::expense::{Expense, ExpenseId};
use crate::model::report::{Report, ReportId};
use crate::repo::expense_repo::{ExpenseRepository, RepoResult};
use crate::repo::report_repo::ReportRepository;
use log::{debug, info};

/// A report together with the expenses filed under it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDetails {
    pub report: Report,
    pub expenses: Vec<Expense>,
}

impl ReportDetails {
    /// Sum of the filed expense values. An empty report totals 0.
    pub fn total(&self) -> f64 {
        self.expenses.iter().map(|expense| expense.value).sum()
    }
}

/// Business-rule layer over a report repository and the expense store its
/// memberships point into.
pub struct ReportService<R: ReportRepository, E: ExpenseRepository> {
    reports: R,
    expenses: E,
}

impl<R: ReportRepository, E: ExpenseRepository> ReportService<R, E> {
    pub fn new(reports: R, expenses: E) -> Self {
        Self { reports, expenses }
    }

    pub fn report_repository(&self) -> &R {
        &self.reports
    }

    pub fn expense_repository(&self) -> &E {
        &self.expenses
    }

    pub fn list_reports(&self) -> RepoResult<Vec<ReportDetails>> {
        self.reports
            .load_reports()?
            .into_iter()
            .map(|report| self.details(report))
            .collect()
    }

    pub fn get_report(&self, id: ReportId) -> RepoResult<Option<ReportDetails>> {
        match self.reports.read_report(id)? {
            Some(report) => Ok(Some(self.details(report)?)),
            None => Ok(None),
        }
    }

    /// Creates an empty report.
    ///
    /// # Contract
    /// - Returns `Ok(None)` without writing when `id` already exists.
    /// - Returns `Err(RepoError::ReportValidation(_))` for a blank title or
    ///   status.
    pub fn create_report(
        &self,
        id: ReportId,
        title: impl Into<String>,
        status: impl Into<String>,
    ) -> RepoResult<Option<ReportDetails>> {
        let report = Report::new(id, title, status);
        report.validate()?;
        if self.reports.read_report(id)?.is_some() {
            info!("event=report_create module=service status=duplicate id={id}");
            return Ok(None);
        }

        self.reports.create_report(&report)?;
        info!("event=report_create module=service status=ok id={id}");
        Ok(Some(ReportDetails {
            report,
            expenses: Vec::new(),
        }))
    }

    /// Replaces title and status of an existing report. Filed expenses are
    /// kept.
    pub fn update_report(&self, report: &Report) -> RepoResult<bool> {
        report.validate()?;
        if self.reports.read_report(report.id)?.is_none() {
            return Ok(false);
        }
        self.reports.update_report(report)?;
        info!("event=report_update module=service status=ok id={}", report.id);
        Ok(true)
    }

    /// Deletes a report, reporting whether it existed. Its expenses stay in
    /// the expense store.
    pub fn delete_report(&self, id: ReportId) -> RepoResult<bool> {
        if self.reports.read_report(id)?.is_none() {
            return Ok(false);
        }
        self.reports.delete_report(id)?;
        info!("event=report_delete module=service status=ok id={id}");
        Ok(true)
    }

    /// Files an expense under a report, moving it out of any other report.
    ///
    /// Returns `Ok(false)` without writing when either id is unknown.
    pub fn add_expense(&self, report_id: ReportId, expense_id: ExpenseId) -> RepoResult<bool> {
        if self.reports.read_report(report_id)?.is_none()
            || self.expenses.read_expense(expense_id)?.is_none()
        {
            return Ok(false);
        }
        self.reports.assign_expense(expense_id, Some(report_id))?;
        info!(
            "event=report_link module=service status=ok report_id={report_id} expense_id={expense_id}"
        );
        Ok(true)
    }

    /// Takes an expense out of a report.
    ///
    /// Returns `Ok(false)` when the expense is not filed under `report_id`.
    pub fn remove_expense(&self, report_id: ReportId, expense_id: ExpenseId) -> RepoResult<bool> {
        if self.reports.report_of_expense(expense_id)? != Some(report_id) {
            return Ok(false);
        }
        self.reports.assign_expense(expense_id, None)?;
        info!(
            "event=report_unlink module=service status=ok report_id={report_id} expense_id={expense_id}"
        );
        Ok(true)
    }

    fn details(&self, report: Report) -> RepoResult<ReportDetails> {
        let mut expenses = Vec::new();
        for expense_id in self.reports.report_expense_ids(report.id)? {
            match self.expenses.read_expense(expense_id)? {
                Some(expense) => expenses.push(expense),
                None => debug!(
                    "event=report_resolve module=service status=stale report_id={} expense_id={expense_id}",
                    report.id
                ),
            }
        }
        Ok(ReportDetails { report, expenses })
    }
}
