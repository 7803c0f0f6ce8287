//! Report repository contract and the JSON file backend.
//!
//! # Responsibility
//! - Define report CRUD plus the expense-to-report link.
//! - Persist reports and their memberships in one JSON file.
//!
//! # Invariants
//! - An expense is linked to at most one report; assigning it moves it.
//! - Deleting a report releases its expenses; the expenses stay stored.
//! - The file backend knows nothing about the expense store, so expense
//!   existence is checked by the caller before `assign_expense`.

use crate::model::expense::ExpenseId;
use crate::model::report::{Report, ReportId};
use crate::repo::expense_repo::{RepoError, RepoResult};
use crate::repo::file_repo::{lock_file, read_file, write_file};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const REPORT_FORMAT: &str = "report_json";

/// Storage contract for reports and expense membership.
pub trait ReportRepository {
    /// Inserts a new report with no expenses.
    ///
    /// Fails with `DuplicateReport` when the id is already stored.
    fn create_report(&self, report: &Report) -> RepoResult<()>;

    fn read_report(&self, id: ReportId) -> RepoResult<Option<Report>>;

    /// Replaces title and status. Memberships are kept.
    ///
    /// Fails with `ReportNotFound` when the id is not stored.
    fn update_report(&self, report: &Report) -> RepoResult<()>;

    /// Removes a report and releases its expenses. Missing ids are ignored.
    fn delete_report(&self, id: ReportId) -> RepoResult<()>;

    fn load_reports(&self) -> RepoResult<Vec<Report>>;

    /// Files `expense_id` under `report_id`, or releases it with `None`.
    ///
    /// Fails with `ReportNotFound` when `report_id` is not stored.
    fn assign_expense(&self, expense_id: ExpenseId, report_id: Option<ReportId>)
        -> RepoResult<()>;

    /// Lists expense ids filed under `report_id` in ascending order. Unknown
    /// reports have none.
    fn report_expense_ids(&self, report_id: ReportId) -> RepoResult<Vec<ExpenseId>>;

    /// Returns the report currently holding `expense_id`, if any.
    fn report_of_expense(&self, expense_id: ExpenseId) -> RepoResult<Option<ReportId>>;
}

impl<R: ReportRepository + ?Sized> ReportRepository for &R {
    fn create_report(&self, report: &Report) -> RepoResult<()> {
        (**self).create_report(report)
    }

    fn read_report(&self, id: ReportId) -> RepoResult<Option<Report>> {
        (**self).read_report(id)
    }

    fn update_report(&self, report: &Report) -> RepoResult<()> {
        (**self).update_report(report)
    }

    fn delete_report(&self, id: ReportId) -> RepoResult<()> {
        (**self).delete_report(id)
    }

    fn load_reports(&self) -> RepoResult<Vec<Report>> {
        (**self).load_reports()
    }

    fn assign_expense(
        &self,
        expense_id: ExpenseId,
        report_id: Option<ReportId>,
    ) -> RepoResult<()> {
        (**self).assign_expense(expense_id, report_id)
    }

    fn report_expense_ids(&self, report_id: ReportId) -> RepoResult<Vec<ExpenseId>> {
        (**self).report_expense_ids(report_id)
    }

    fn report_of_expense(&self, expense_id: ExpenseId) -> RepoResult<Option<ReportId>> {
        (**self).report_of_expense(expense_id)
    }
}

/// On-disk shape of one report, membership included. `expense_ids` is kept
/// sorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredReport {
    id: ReportId,
    title: String,
    status: String,
    #[serde(default)]
    expense_ids: Vec<ExpenseId>,
}

impl StoredReport {
    fn from_report(report: &Report) -> Self {
        Self {
            id: report.id,
            title: report.title.clone(),
            status: report.status.clone(),
            expense_ids: Vec::new(),
        }
    }

    fn to_report(&self) -> Report {
        Report::new(self.id, self.title.as_str(), self.status.as_str())
    }
}

/// Report repository that keeps every report in one JSON file.
pub struct FileReportRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileReportRepository {
    /// Creates a repository over `path`. The file is not touched until the
    /// first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        lock_file(&self.lock)
    }

    fn read_all(&self) -> RepoResult<Vec<StoredReport>> {
        let Some(text) = read_file(&self.path, REPORT_FORMAT)? else {
            return Ok(Vec::new());
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&text).map_err(|err| {
            error!(
                "event=file_read module=repo status=error format={REPORT_FORMAT} path={} error_code=decode_failed error={err}",
                self.path.display()
            );
            RepoError::Json(err)
        })
    }

    fn write_all(&self, reports: &[StoredReport]) -> RepoResult<()> {
        let mut body = serde_json::to_string_pretty(reports)?;
        body.push('\n');
        write_file(&self.path, &body)?;

        debug!(
            "event=file_write module=repo status=ok format={REPORT_FORMAT} path={} records={}",
            self.path.display(),
            reports.len()
        );
        Ok(())
    }
}

impl ReportRepository for FileReportRepository {
    fn create_report(&self, report: &Report) -> RepoResult<()> {
        let _guard = self.lock();
        let mut reports = self.read_all()?;
        if position_of(&reports, report.id).is_some() {
            return Err(RepoError::DuplicateReport(report.id));
        }
        reports.push(StoredReport::from_report(report));
        self.write_all(&reports)
    }

    fn read_report(&self, id: ReportId) -> RepoResult<Option<Report>> {
        let _guard = self.lock();
        let reports = self.read_all()?;
        Ok(reports
            .iter()
            .find(|stored| stored.id == id)
            .map(StoredReport::to_report))
    }

    fn update_report(&self, report: &Report) -> RepoResult<()> {
        let _guard = self.lock();
        let mut reports = self.read_all()?;
        let index = position_of(&reports, report.id).ok_or(RepoError::ReportNotFound(report.id))?;
        reports[index].title = report.title.clone();
        reports[index].status = report.status.clone();
        self.write_all(&reports)
    }

    fn delete_report(&self, id: ReportId) -> RepoResult<()> {
        let _guard = self.lock();
        let mut reports = self.read_all()?;
        let before = reports.len();
        reports.retain(|stored| stored.id != id);
        if reports.len() == before {
            return Ok(());
        }
        self.write_all(&reports)
    }

    fn load_reports(&self) -> RepoResult<Vec<Report>> {
        let _guard = self.lock();
        Ok(self
            .read_all()?
            .iter()
            .map(StoredReport::to_report)
            .collect())
    }

    fn assign_expense(
        &self,
        expense_id: ExpenseId,
        report_id: Option<ReportId>,
    ) -> RepoResult<()> {
        let _guard = self.lock();
        let mut reports = self.read_all()?;
        let target = match report_id {
            Some(id) => Some(position_of(&reports, id).ok_or(RepoError::ReportNotFound(id))?),
            None => None,
        };

        for stored in &mut reports {
            stored.expense_ids.retain(|id| *id != expense_id);
        }
        if let Some(index) = target {
            let members = &mut reports[index].expense_ids;
            if let Err(slot) = members.binary_search(&expense_id) {
                members.insert(slot, expense_id);
            }
        }
        self.write_all(&reports)
    }

    fn report_expense_ids(&self, report_id: ReportId) -> RepoResult<Vec<ExpenseId>> {
        let _guard = self.lock();
        let reports = self.read_all()?;
        Ok(reports
            .into_iter()
            .find(|stored| stored.id == report_id)
            .map(|stored| stored.expense_ids)
            .unwrap_or_default())
    }

    fn report_of_expense(&self, expense_id: ExpenseId) -> RepoResult<Option<ReportId>> {
        let _guard = self.lock();
        let reports = self.read_all()?;
        Ok(reports
            .iter()
            .find(|stored| stored.expense_ids.contains(&expense_id))
            .map(|stored| stored.id))
    }
}

fn position_of(reports: &[StoredReport], id: ReportId) -> Option<usize> {
    reports.iter().position(|stored| stored.id == id)
}
