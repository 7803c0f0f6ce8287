//! Whole-file expense repository shared by the text, CSV and JSON backends.
//!
//! # Responsibility
//! - Implement the repository contract once as load, mutate, rewrite.
//! - Delegate the on-disk format to an `ExpenseCodec`.
//!
//! # Invariants
//! - Each operation holds the instance lock for its full read-modify-write
//!   cycle, so calls on one instance never interleave.
//! - A missing file is an empty dataset; any other read failure is an error.
//! - Rewrites go through a sibling temp file and a rename.
//! - Record order in the file is insertion order.

use crate::model::expense::{Expense, ExpenseId};
use crate::repo::expense_repo::{ExpenseRepository, RepoError, RepoResult};
use log::{debug, error};
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

const TMP_SUFFIX: &str = "tmp";

/// On-disk format for a whole expense dataset.
pub trait ExpenseCodec {
    /// Short format label used in log events.
    const FORMAT: &'static str;

    /// Parses a complete file body.
    fn decode(text: &str) -> RepoResult<Vec<Expense>>;

    /// Renders a complete file body.
    fn encode(expenses: &[Expense]) -> RepoResult<String>;
}

/// Repository that keeps the whole dataset in one file.
pub struct FileExpenseRepository<C> {
    path: PathBuf,
    lock: Mutex<()>,
    codec: PhantomData<fn() -> C>,
}

impl<C: ExpenseCodec> FileExpenseRepository<C> {
    /// Creates a repository over `path`. The file is not touched until the
    /// first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            codec: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        lock_file(&self.lock)
    }

    fn read_all(&self) -> RepoResult<Vec<Expense>> {
        let Some(text) = read_file(&self.path, C::FORMAT)? else {
            return Ok(Vec::new());
        };

        C::decode(&text).map_err(|err| {
            error!(
                "event=file_read module=repo status=error format={} path={} error_code=decode_failed error={err}",
                C::FORMAT,
                self.path.display()
            );
            err
        })
    }

    fn write_all(&self, expenses: &[Expense]) -> RepoResult<()> {
        let body = C::encode(expenses)?;
        write_file(&self.path, &body)?;

        debug!(
            "event=file_write module=repo status=ok format={} path={} records={}",
            C::FORMAT,
            self.path.display(),
            expenses.len()
        );
        Ok(())
    }
}

/// Acquires a whole-file lock.
pub(crate) fn lock_file(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    // The guarded value is `()`, so a poisoned lock holds no broken state.
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reads a whole data file. A missing file is `Ok(None)`.
pub(crate) fn read_file(path: &Path, format: &str) -> RepoResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => {
            error!(
                "event=file_read module=repo status=error format={format} path={} error={err}",
                path.display()
            );
            Err(err.into())
        }
    }
}

/// Replaces a data file through a sibling temp file, creating parent
/// directories on the way.
pub(crate) fn write_file(path: &Path, body: &str) -> RepoResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl<C: ExpenseCodec> ExpenseRepository for FileExpenseRepository<C> {
    fn create_expense(&self, expense: &Expense) -> RepoResult<()> {
        let _guard = self.lock();
        let mut expenses = self.read_all()?;
        if position_of(&expenses, expense.id).is_some() {
            return Err(RepoError::Duplicate(expense.id));
        }
        expenses.push(expense.clone());
        self.write_all(&expenses)
    }

    fn read_expense(&self, id: ExpenseId) -> RepoResult<Option<Expense>> {
        let _guard = self.lock();
        let expenses = self.read_all()?;
        Ok(expenses.into_iter().find(|expense| expense.id == id))
    }

    fn update_expense(&self, expense: &Expense) -> RepoResult<()> {
        let _guard = self.lock();
        let mut expenses = self.read_all()?;
        let index = position_of(&expenses, expense.id).ok_or(RepoError::NotFound(expense.id))?;
        expenses[index] = expense.clone();
        self.write_all(&expenses)
    }

    fn delete_expense(&self, id: ExpenseId) -> RepoResult<()> {
        let _guard = self.lock();
        let mut expenses = self.read_all()?;
        let before = expenses.len();
        expenses.retain(|expense| expense.id != id);
        if expenses.len() == before {
            return Ok(());
        }
        self.write_all(&expenses)
    }

    fn load_expenses(&self) -> RepoResult<Vec<Expense>> {
        let _guard = self.lock();
        self.read_all()
    }

    fn save_expenses(&self, incoming: &[Expense]) -> RepoResult<()> {
        let _guard = self.lock();
        let mut expenses = self.read_all()?;
        for expense in incoming {
            match position_of(&expenses, expense.id) {
                Some(index) => expenses[index] = expense.clone(),
                None => expenses.push(expense.clone()),
            }
        }
        self.write_all(&expenses)
    }
}

fn position_of(expenses: &[Expense], id: ExpenseId) -> Option<usize> {
    expenses.iter().position(|expense| expense.id == id)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}
