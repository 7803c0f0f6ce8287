use chrono::NaiveDate;
use expense_core::{
    BackendKind, DocumentExpenseRepository, Expense, ExpenseId, ExpenseRepository,
    ExpenseService, JsonExpenseRepository, MemoryCollection, RepoError, RepoResult,
    SqliteExpenseRepository, StoreConfig, SEED_EXPENSES,
};
use std::cell::Cell;
use std::sync::Arc;

/// Wraps a repository and counts write calls.
struct CountingRepository<R> {
    inner: R,
    writes: Cell<usize>,
}

impl<R: ExpenseRepository> CountingRepository<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            writes: Cell::new(0),
        }
    }

    fn writes(&self) -> usize {
        self.writes.get()
    }

    fn record_write(&self) {
        self.writes.set(self.writes.get() + 1);
    }
}

impl<R: ExpenseRepository> ExpenseRepository for CountingRepository<R> {
    fn create_expense(&self, expense: &Expense) -> RepoResult<()> {
        self.record_write();
        self.inner.create_expense(expense)
    }

    fn read_expense(&self, id: ExpenseId) -> RepoResult<Option<Expense>> {
        self.inner.read_expense(id)
    }

    fn update_expense(&self, expense: &Expense) -> RepoResult<()> {
        self.record_write();
        self.inner.update_expense(expense)
    }

    fn delete_expense(&self, id: ExpenseId) -> RepoResult<()> {
        self.record_write();
        self.inner.delete_expense(id)
    }

    fn load_expenses(&self) -> RepoResult<Vec<Expense>> {
        self.inner.load_expenses()
    }
}

/// Repository whose medium is always unavailable.
struct UnreachableRepository;

impl ExpenseRepository for UnreachableRepository {
    fn create_expense(&self, _expense: &Expense) -> RepoResult<()> {
        Err(unreachable_error())
    }

    fn read_expense(&self, _id: ExpenseId) -> RepoResult<Option<Expense>> {
        Err(unreachable_error())
    }

    fn update_expense(&self, _expense: &Expense) -> RepoResult<()> {
        Err(unreachable_error())
    }

    fn delete_expense(&self, _id: ExpenseId) -> RepoResult<()> {
        Err(unreachable_error())
    }

    fn load_expenses(&self) -> RepoResult<Vec<Expense>> {
        Err(unreachable_error())
    }
}

fn unreachable_error() -> RepoError {
    RepoError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "store unreachable",
    ))
}

#[test]
fn new_seeds_empty_store_with_default_records() {
    let service = ExpenseService::new(SqliteExpenseRepository::in_memory().unwrap()).unwrap();

    let expenses = service.list_expenses().unwrap();
    assert_eq!(expenses.len(), SEED_EXPENSES.len());
    for ((id, value, merchant), expense) in SEED_EXPENSES.iter().zip(&expenses) {
        assert_eq!(expense.id, *id);
        assert_eq!(expense.value, *value);
        assert_eq!(expense.merchant, *merchant);
    }
}

#[test]
fn seeding_twice_does_not_duplicate_records() {
    let collection = Arc::new(MemoryCollection::new());

    let first = ExpenseService::new(DocumentExpenseRepository::new(Arc::clone(&collection)))
        .unwrap();
    let second = ExpenseService::new(DocumentExpenseRepository::new(Arc::clone(&collection)))
        .unwrap();

    assert_eq!(collection.len(), SEED_EXPENSES.len());
    assert!(!second.seed().unwrap());
    assert_eq!(first.list_expenses().unwrap().len(), SEED_EXPENSES.len());
}

#[test]
fn seed_leaves_populated_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("expenses.json");
    let repo = JsonExpenseRepository::new(&path);
    repo.create_expense(&sample(42, 12.0, "Existing")).unwrap();

    let service = ExpenseService::new(CountingRepository::new(repo)).unwrap();
    assert_eq!(service.repository().writes(), 0);
    assert_eq!(service.list_expenses().unwrap(), vec![sample(42, 12.0, "Existing")]);
}

#[test]
fn create_new_expense_returns_created_record_dated_today() {
    let service = ExpenseService::without_seed(SqliteExpenseRepository::in_memory().unwrap());
    let today = chrono::Local::now().date_naive();

    let created = service.create_new_expense(4, 50.0, "Revature").unwrap().unwrap();
    assert_eq!(created.id, 4);
    assert_eq!(created.value, 50.0);
    assert_eq!(created.merchant, "Revature");
    assert!(created.date >= today);

    assert_eq!(service.get_expense(4).unwrap(), Some(created));
}

#[test]
fn create_new_expense_with_existing_id_returns_none_without_writing() {
    let repo = CountingRepository::new(DocumentExpenseRepository::new(MemoryCollection::new()));
    repo.create_expense(&sample(1, 99.95, "Walmart")).unwrap();
    let service = ExpenseService::without_seed(repo);

    let result = service.create_new_expense(1, 5.0, "Impostor").unwrap();
    assert_eq!(result, None);
    assert_eq!(service.repository().writes(), 1);
    assert_eq!(service.get_expense(1).unwrap(), Some(sample(1, 99.95, "Walmart")));
}

#[test]
fn create_new_expense_validates_before_writing() {
    let repo = CountingRepository::new(DocumentExpenseRepository::new(MemoryCollection::new()));
    let service = ExpenseService::without_seed(repo);

    let err = service.create_new_expense(1, -10.0, "Refund").unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    let err = service.create_new_expense(2, 10.0, "  ").unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    assert_eq!(service.repository().writes(), 0);
    assert!(service.list_expenses().unwrap().is_empty());
}

#[test]
fn delete_expense_reports_whether_record_existed() {
    let repo = CountingRepository::new(SqliteExpenseRepository::in_memory().unwrap());
    let service = ExpenseService::new(repo).unwrap();
    let writes_after_seed = service.repository().writes();
    let size_before = service.list_expenses().unwrap().len();

    assert!(!service.delete_expense(999).unwrap());
    assert_eq!(service.repository().writes(), writes_after_seed);
    assert_eq!(service.list_expenses().unwrap().len(), size_before);

    assert!(service.delete_expense(1).unwrap());
    assert_eq!(service.get_expense(1).unwrap(), None);
    assert_eq!(service.list_expenses().unwrap().len(), size_before - 1);
}

#[test]
fn update_expense_only_touches_existing_records() {
    let repo = CountingRepository::new(DocumentExpenseRepository::new(MemoryCollection::new()));
    repo.create_expense(&sample(1, 10.0, "HEB")).unwrap();
    let service = ExpenseService::without_seed(repo);

    // The document store would upsert; the service must not.
    assert!(!service.update_expense(&sample(2, 1.0, "Ghost")).unwrap());
    assert_eq!(service.get_expense(2).unwrap(), None);
    assert_eq!(service.repository().writes(), 1);

    assert!(service.update_expense(&sample(1, 11.0, "HEB Plus")).unwrap());
    assert_eq!(service.get_expense(1).unwrap(), Some(sample(1, 11.0, "HEB Plus")));

    let err = service.update_expense(&sample(1, 0.0, "HEB")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn sum_of_empty_store_is_zero() {
    let service = ExpenseService::without_seed(DocumentExpenseRepository::new(MemoryCollection::new()));
    assert_eq!(service.sum_expenses().unwrap(), 0.0);
}

#[test]
fn sum_adds_all_values() {
    let repo = DocumentExpenseRepository::new(MemoryCollection::new());
    repo.save_expenses(&[
        sample(1, 99.95, "Walmart"),
        sample(2, 85.75, "Costco"),
        sample(3, 10000.0, "Private Jet"),
    ])
    .unwrap();
    let service = ExpenseService::without_seed(repo);

    let sum = service.sum_expenses().unwrap();
    assert!((sum - 10185.70).abs() < 1e-9, "sum was {sum}");
}

#[test]
fn search_by_merchant_returns_matching_records() {
    let service = ExpenseService::new(SqliteExpenseRepository::in_memory().unwrap()).unwrap();
    service.create_new_expense(5, 12.0, "HEB").unwrap();

    let ids: Vec<ExpenseId> = service
        .search_by_merchant("HEB")
        .unwrap()
        .iter()
        .map(|expense| expense.id)
        .collect();
    assert_eq!(ids, vec![3, 5]);
}

#[test]
fn print_expenses_writes_one_line_per_record() {
    let repo = DocumentExpenseRepository::new(MemoryCollection::new());
    repo.save_expenses(&[sample(1, 99.95, "Walmart"), sample(2, 55.99, "Costco")])
        .unwrap();
    let service = ExpenseService::without_seed(repo);

    let mut out = Vec::new();
    let printed = service.print_expenses(&mut out).unwrap();
    assert_eq!(printed, 2);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Expense [id=1, date=2026-10-18, value=99.95, merchant=Walmart]\n\
         Expense [id=2, date=2026-10-18, value=55.99, merchant=Costco]\n"
    );
}

/// Output sink that refuses every write.
struct ClosedOutput;

impl std::io::Write for ClosedOutput {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn print_failure_is_reported_as_output_error() {
    let repo = DocumentExpenseRepository::new(MemoryCollection::new());
    repo.create_expense(&sample(1, 99.95, "Walmart")).unwrap();
    let service = ExpenseService::without_seed(repo);

    let err = service.print_expenses(&mut ClosedOutput).unwrap_err();
    assert!(matches!(err, RepoError::Output(_)), "{err}");
    assert_eq!(service.list_expenses().unwrap().len(), 1);
}

#[test]
fn medium_failures_propagate_and_misses_do_not() {
    let service = ExpenseService::without_seed(UnreachableRepository);
    assert!(matches!(service.get_expense(1), Err(RepoError::Io(_))));
    assert!(matches!(service.sum_expenses(), Err(RepoError::Io(_))));
    assert!(ExpenseService::new(UnreachableRepository).is_err());

    let healthy = ExpenseService::without_seed(DocumentExpenseRepository::new(MemoryCollection::new()));
    assert_eq!(healthy.get_expense(1).unwrap(), None);
}

#[test]
fn service_behaves_the_same_for_every_configured_backend() {
    let dir = tempfile::tempdir().unwrap();
    for kind in BackendKind::ALL {
        let mut config = StoreConfig::new(kind);
        if let Some(name) = kind.default_file_name() {
            config = config.with_path(dir.path().join(name));
        }
        let repo = expense_core::open_repository(&config).unwrap();
        let service = ExpenseService::new(repo).unwrap();

        assert_eq!(service.list_expenses().unwrap().len(), SEED_EXPENSES.len(), "{kind}");
        assert!(service.create_new_expense(1, 1.0, "Again").unwrap().is_none(), "{kind}");
        assert!(service.create_new_expense(10, 10.0, "New").unwrap().is_some(), "{kind}");
        assert!(service.delete_expense(2).unwrap(), "{kind}");
        assert!(!service.delete_expense(2).unwrap(), "{kind}");

        let expected = 99.95 + 29.99 + 72.00 + 10.0;
        let sum = service.sum_expenses().unwrap();
        assert!((sum - expected).abs() < 1e-9, "{kind}: sum was {sum}");
    }
}

fn sample(id: i64, value: f64, merchant: &str) -> Expense {
    Expense::new(id, day(2026, 10, 18), value, merchant)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
