//! Document-store expense backend.
//!
//! # Responsibility
//! - Map expenses to `_id`-keyed documents with string dates.
//! - Talk to storage only through the `DocumentCollection` seam, so a
//!   networked driver can replace the in-process `MemoryCollection`.
//!
//! # Invariants
//! - `_id` is the expense id; documents never carry a separate `id` key.
//! - `update_expense` upserts: a missing id is inserted.
//! - Non-finite values never reach the collection; a document number cannot
//!   hold them.
//! - Concurrency control belongs to the collection, not the repository.

use crate::model::expense::{Expense, ExpenseId};
use crate::repo::expense_repo::{
    require_finite_value, ExpenseRepository, RepoError, RepoResult,
};
use chrono::NaiveDate;
use log::debug;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// One stored document.
pub type Document = Map<String, Value>;

const ID_KEY: &str = "_id";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Minimal collection API the document backend needs from a driver.
pub trait DocumentCollection {
    /// Inserts a document keyed by its `_id`. Fails with `Duplicate` if the
    /// key exists.
    fn insert_one(&self, id: ExpenseId, document: Document) -> RepoResult<()>;
    fn find_one(&self, id: ExpenseId) -> RepoResult<Option<Document>>;
    /// Replaces the document stored under `id`; returns whether one matched.
    fn replace_one(&self, id: ExpenseId, document: Document) -> RepoResult<bool>;
    /// Removes the document stored under `id`; returns whether one matched.
    fn delete_one(&self, id: ExpenseId) -> RepoResult<bool>;
    /// Returns all documents ordered by `_id`.
    fn find_all(&self) -> RepoResult<Vec<Document>>;
}

impl<C: DocumentCollection + ?Sized> DocumentCollection for Arc<C> {
    fn insert_one(&self, id: ExpenseId, document: Document) -> RepoResult<()> {
        (**self).insert_one(id, document)
    }

    fn find_one(&self, id: ExpenseId) -> RepoResult<Option<Document>> {
        (**self).find_one(id)
    }

    fn replace_one(&self, id: ExpenseId, document: Document) -> RepoResult<bool> {
        (**self).replace_one(id, document)
    }

    fn delete_one(&self, id: ExpenseId) -> RepoResult<bool> {
        (**self).delete_one(id)
    }

    fn find_all(&self) -> RepoResult<Vec<Document>> {
        (**self).find_all()
    }
}

/// In-process document collection.
///
/// Readers share the lock; writers hold it exclusively for one document
/// operation.
#[derive(Debug, Default)]
pub struct MemoryCollection {
    documents: RwLock<BTreeMap<ExpenseId, Document>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentCollection for MemoryCollection {
    fn insert_one(&self, id: ExpenseId, document: Document) -> RepoResult<()> {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if documents.contains_key(&id) {
            return Err(RepoError::Duplicate(id));
        }
        documents.insert(id, document);
        Ok(())
    }

    fn find_one(&self, id: ExpenseId) -> RepoResult<Option<Document>> {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        Ok(documents.get(&id).cloned())
    }

    fn replace_one(&self, id: ExpenseId, document: Document) -> RepoResult<bool> {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match documents.get_mut(&id) {
            Some(slot) => {
                *slot = document;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_one(&self, id: ExpenseId) -> RepoResult<bool> {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(documents.remove(&id).is_some())
    }

    fn find_all(&self) -> RepoResult<Vec<Document>> {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        Ok(documents.values().cloned().collect())
    }
}

/// Expense repository over a document collection.
pub struct DocumentExpenseRepository<C> {
    collection: C,
}

impl<C: DocumentCollection> DocumentExpenseRepository<C> {
    pub fn new(collection: C) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }
}

impl<C: DocumentCollection> ExpenseRepository for DocumentExpenseRepository<C> {
    fn create_expense(&self, expense: &Expense) -> RepoResult<()> {
        self.collection
            .insert_one(expense.id, expense_to_document(expense)?)?;
        debug!("event=expense_insert module=repo status=ok backend=document id={}", expense.id);
        Ok(())
    }

    fn read_expense(&self, id: ExpenseId) -> RepoResult<Option<Expense>> {
        self.collection
            .find_one(id)?
            .map(|document| document_to_expense(&document))
            .transpose()
    }

    fn update_expense(&self, expense: &Expense) -> RepoResult<()> {
        let document = expense_to_document(expense)?;
        if !self.collection.replace_one(expense.id, document.clone())? {
            debug!(
                "event=expense_upsert module=repo status=inserted backend=document id={}",
                expense.id
            );
            self.collection.insert_one(expense.id, document)?;
        }
        Ok(())
    }

    fn delete_expense(&self, id: ExpenseId) -> RepoResult<()> {
        self.collection.delete_one(id)?;
        Ok(())
    }

    fn load_expenses(&self) -> RepoResult<Vec<Expense>> {
        self.collection
            .find_all()?
            .iter()
            .map(document_to_expense)
            .collect()
    }

    fn save_expenses(&self, expenses: &[Expense]) -> RepoResult<()> {
        for expense in expenses {
            self.update_expense(expense)?;
        }
        Ok(())
    }
}

/// Renders an expense as a store document.
///
/// # Errors
/// - `InvalidData` when `value` is NaN or infinite.
pub fn expense_to_document(expense: &Expense) -> RepoResult<Document> {
    require_finite_value(expense)?;
    let mut document = Document::new();
    document.insert(ID_KEY.to_string(), Value::from(expense.id));
    document.insert(
        "date".to_string(),
        Value::from(expense.date.format(DATE_FORMAT).to_string()),
    );
    document.insert("value".to_string(), Value::from(expense.value));
    document.insert("merchant".to_string(), Value::from(expense.merchant.as_str()));
    Ok(document)
}

/// Maps a store document back to an expense.
///
/// # Errors
/// - `InvalidData` when a field is missing or has the wrong type.
pub fn document_to_expense(document: &Document) -> RepoResult<Expense> {
    let field = |key: &str| {
        document
            .get(key)
            .ok_or_else(|| RepoError::InvalidData(format!("document is missing `{key}`")))
    };

    let id = field(ID_KEY)?
        .as_i64()
        .ok_or_else(|| RepoError::InvalidData("document `_id` is not an integer".to_string()))?;
    let date_text = field("date")?.as_str().ok_or_else(|| {
        RepoError::InvalidData(format!("document {id}: `date` is not a string"))
    })?;
    let date = NaiveDate::parse_from_str(date_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!("document {id}: invalid date `{date_text}`"))
    })?;
    let value = field("value")?.as_f64().ok_or_else(|| {
        RepoError::InvalidData(format!("document {id}: `value` is not a number"))
    })?;
    let merchant = field("merchant")?.as_str().ok_or_else(|| {
        RepoError::InvalidData(format!("document {id}: `merchant` is not a string"))
    })?;

    Ok(Expense::new(id, date, value, merchant))
}
