//! Expense use-case service.
//!
//! # Responsibility
//! - Enforce id uniqueness and existence checks uniformly for every backend.
//! - Validate values before they reach storage.
//! - Seed demo data into an empty store.
//!
//! # Invariants
//! - Creating an existing id returns `Ok(None)` and performs no write.
//! - Deleting or updating a missing id returns `Ok(false)` and performs no write.
//! - Lookup misses are never errors; backend failures always propagate.
//! - `ExpenseService::new` may write seed data to storage.

use crate::model::expense::{Expense, ExpenseId};
use crate::repo::expense_repo::{ExpenseRepository, RepoError, RepoResult};
use log::info;
use std::io::Write;

/// Records written by [`ExpenseService::seed`] into an empty store.
pub const SEED_EXPENSES: &[(ExpenseId, f64, &str)] = &[
    (1, 99.95, "Walmart"),
    (2, 55.99, "Costco"),
    (3, 29.99, "HEB"),
    (4, 72.00, "Buffalo Wild Wings"),
];

/// Business-rule layer over an expense repository.
pub struct ExpenseService<R: ExpenseRepository> {
    repo: R,
}

impl<R: ExpenseRepository> ExpenseService<R> {
    /// Creates a service and seeds the store when it is empty.
    ///
    /// # Side effects
    /// - Writes [`SEED_EXPENSES`] when `load_expenses()` returns nothing.
    pub fn new(repo: R) -> RepoResult<Self> {
        let service = Self::without_seed(repo);
        service.seed()?;
        Ok(service)
    }

    /// Creates a service without touching storage.
    pub fn without_seed(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Populates an empty store with [`SEED_EXPENSES`].
    ///
    /// Returns `true` when seed data was written, `false` when the store
    /// already held expenses.
    pub fn seed(&self) -> RepoResult<bool> {
        let existing = self.repo.load_expenses()?.len();
        if existing > 0 {
            info!("event=seed module=service status=skipped existing={existing}");
            return Ok(false);
        }

        for &(id, value, merchant) in SEED_EXPENSES {
            self.create_new_expense(id, value, merchant)?;
        }
        info!(
            "event=seed module=service status=ok inserted={}",
            SEED_EXPENSES.len()
        );
        Ok(true)
    }

    /// Creates an expense dated today.
    ///
    /// # Contract
    /// - Returns `Ok(None)` without writing when `id` already exists.
    /// - Returns `Err(RepoError::Validation(_))` for a non-positive or
    ///   non-finite value or a blank merchant.
    pub fn create_new_expense(
        &self,
        id: ExpenseId,
        value: f64,
        merchant: impl Into<String>,
    ) -> RepoResult<Option<Expense>> {
        if self.repo.read_expense(id)?.is_some() {
            info!("event=expense_create module=service status=duplicate id={id}");
            return Ok(None);
        }

        let expense = Expense::dated_today(id, value, merchant);
        expense.validate()?;
        self.repo.create_expense(&expense)?;

        info!("event=expense_create module=service status=ok id={id}");
        Ok(Some(expense))
    }

    /// Gets one expense by id.
    pub fn get_expense(&self, id: ExpenseId) -> RepoResult<Option<Expense>> {
        self.repo.read_expense(id)
    }

    /// Replaces an existing expense.
    ///
    /// Returns `Ok(false)` without writing when the id is unknown, so the
    /// outcome never depends on a backend's upsert policy.
    pub fn update_expense(&self, expense: &Expense) -> RepoResult<bool> {
        expense.validate()?;
        if self.repo.read_expense(expense.id)?.is_none() {
            return Ok(false);
        }
        self.repo.update_expense(expense)?;
        info!("event=expense_update module=service status=ok id={}", expense.id);
        Ok(true)
    }

    /// Deletes an expense, reporting whether it existed.
    pub fn delete_expense(&self, id: ExpenseId) -> RepoResult<bool> {
        if self.repo.read_expense(id)?.is_none() {
            return Ok(false);
        }
        self.repo.delete_expense(id)?;
        info!("event=expense_delete module=service status=ok id={id}");
        Ok(true)
    }

    pub fn list_expenses(&self) -> RepoResult<Vec<Expense>> {
        self.repo.load_expenses()
    }

    /// Lists expenses whose merchant matches exactly.
    pub fn search_by_merchant(&self, merchant: &str) -> RepoResult<Vec<Expense>> {
        self.repo.find_by_merchant(merchant)
    }

    /// Sums `value` across all stored expenses. An empty store sums to 0.
    pub fn sum_expenses(&self) -> RepoResult<f64> {
        Ok(self
            .repo
            .load_expenses()?
            .iter()
            .map(|expense| expense.value)
            .sum())
    }

    /// Writes one line per stored expense to `out` and returns the count.
    ///
    /// A failed write is `RepoError::Output`, never `RepoError::Io`.
    pub fn print_expenses<W: Write>(&self, out: &mut W) -> RepoResult<usize> {
        let expenses = self.repo.load_expenses()?;
        for expense in &expenses {
            writeln!(out, "{expense}").map_err(RepoError::Output)?;
        }
        Ok(expenses.len())
    }
}
