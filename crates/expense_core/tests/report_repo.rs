use chrono::NaiveDate;
use expense_core::{
    Expense, ExpenseRepository, FileReportRepository, JsonExpenseRepository, RepoError, Report,
    ReportRepository, SqliteExpenseRepository,
};

#[test]
fn report_crud_behaves_the_same_on_sqlite_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let sqlite = SqliteExpenseRepository::in_memory().unwrap();
    check_crud("sqlite", &sqlite);
    check_crud("file", &FileReportRepository::new(dir.path().join("reports.json")));
}

#[test]
fn membership_behaves_the_same_on_sqlite_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let sqlite = SqliteExpenseRepository::in_memory().unwrap();
    check_membership("sqlite", &sqlite, &sqlite);

    let reports = FileReportRepository::new(dir.path().join("reports.json"));
    let expenses = JsonExpenseRepository::new(dir.path().join("expenses.json"));
    check_membership("file", &reports, &expenses);
}

#[test]
fn file_reports_persist_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports.json");
    {
        let repo = FileReportRepository::new(&path);
        repo.create_report(&Report::draft(1, "October travel")).unwrap();
        repo.assign_expense(10, Some(1)).unwrap();
    }

    let reopened = FileReportRepository::new(&path);
    assert_eq!(
        reopened.load_reports().unwrap(),
        vec![Report::draft(1, "October travel")]
    );
    assert_eq!(reopened.report_expense_ids(1).unwrap(), vec![10]);
}

#[test]
fn corrupt_report_file_is_a_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports.json");
    std::fs::write(&path, "[{\"id\": 1,").unwrap();

    let err = FileReportRepository::new(&path).load_reports().unwrap_err();
    assert!(matches!(err, RepoError::Json(_)), "{err}");
}

#[test]
fn sqlite_rejects_link_to_missing_expense() {
    let repo = SqliteExpenseRepository::in_memory().unwrap();
    repo.create_report(&Report::draft(1, "Q4")).unwrap();

    let err = repo.assign_expense(42, Some(1)).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(42)), "{err}");
}

#[test]
fn sqlite_expense_writes_keep_report_link() {
    let repo = SqliteExpenseRepository::in_memory().unwrap();
    repo.create_report(&Report::draft(1, "Q4")).unwrap();
    repo.create_expense(&sample(1, 5.0, "HEB")).unwrap();
    repo.assign_expense(1, Some(1)).unwrap();

    repo.update_expense(&sample(1, 6.0, "HEB Plus")).unwrap();
    repo.save_expenses(&[sample(1, 7.0, "HEB"), sample(2, 8.0, "Costco")])
        .unwrap();

    assert_eq!(repo.report_of_expense(1).unwrap(), Some(1));
    assert_eq!(repo.report_of_expense(2).unwrap(), None);
}

#[test]
fn sqlite_foreign_key_rejects_dangling_report_id() {
    let repo = SqliteExpenseRepository::in_memory().unwrap();
    repo.create_expense(&sample(1, 5.0, "HEB")).unwrap();

    let err = repo
        .connection()
        .execute("UPDATE expenses SET report_id = 99 WHERE id = 1;", [])
        .unwrap_err();
    assert!(expense_core::db::DbError::from(err).is_constraint_violation());
}

fn check_crud<R: ReportRepository>(name: &str, repo: &R) {
    assert!(repo.load_reports().unwrap().is_empty(), "{name}");

    repo.create_report(&Report::draft(2, "Client visit")).unwrap();
    repo.create_report(&Report::new(1, "Conference", "SUBMITTED"))
        .unwrap();
    let err = repo.create_report(&Report::draft(1, "Again")).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateReport(1)), "{name}: {err}");

    assert_eq!(
        repo.read_report(1).unwrap(),
        Some(Report::new(1, "Conference", "SUBMITTED")),
        "{name}"
    );
    assert_eq!(repo.read_report(3).unwrap(), None, "{name}");

    repo.update_report(&Report::new(2, "Client visit", "APPROVED"))
        .unwrap();
    assert_eq!(repo.read_report(2).unwrap().unwrap().status, "APPROVED", "{name}");
    let err = repo.update_report(&Report::draft(3, "Ghost")).unwrap_err();
    assert!(matches!(err, RepoError::ReportNotFound(3)), "{name}: {err}");

    repo.delete_report(3).unwrap();
    repo.delete_report(2).unwrap();
    let ids: Vec<_> = repo.load_reports().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1], "{name}");
}

fn check_membership<R: ReportRepository, E: ExpenseRepository>(name: &str, reports: &R, expenses: &E) {
    for id in 1..=3 {
        expenses.create_expense(&sample(id, id as f64, "HEB")).unwrap();
    }
    reports.create_report(&Report::draft(1, "Travel")).unwrap();
    reports.create_report(&Report::draft(2, "Meals")).unwrap();

    reports.assign_expense(1, Some(1)).unwrap();
    reports.assign_expense(2, Some(1)).unwrap();
    reports.assign_expense(3, Some(2)).unwrap();
    assert_eq!(reports.report_expense_ids(1).unwrap(), vec![1, 2], "{name}");
    assert_eq!(reports.report_of_expense(3).unwrap(), Some(2), "{name}");

    // Reassigning moves the expense.
    reports.assign_expense(2, Some(2)).unwrap();
    assert_eq!(reports.report_expense_ids(1).unwrap(), vec![1], "{name}");
    assert_eq!(reports.report_expense_ids(2).unwrap(), vec![2, 3], "{name}");

    reports.assign_expense(3, None).unwrap();
    assert_eq!(reports.report_of_expense(3).unwrap(), None, "{name}");

    let err = reports.assign_expense(1, Some(9)).unwrap_err();
    assert!(matches!(err, RepoError::ReportNotFound(9)), "{name}: {err}");
    assert_eq!(reports.report_of_expense(1).unwrap(), Some(1), "{name}");

    reports.delete_report(2).unwrap();
    assert_eq!(reports.report_of_expense(2).unwrap(), None, "{name}");
    assert!(reports.report_expense_ids(2).unwrap().is_empty(), "{name}");
    assert_eq!(expenses.load_expenses().unwrap().len(), 3, "{name}");
}

fn sample(id: i64, value: f64, merchant: &str) -> Expense {
    Expense::new(id, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(), value, merchant)
}
