// 🗄️ Record Store - Collaborator contract plus an in-memory implementation
//
// The hosted backend owns real persistence. This trait is the seam the host
// talks to; `MemoryStore` backs the CLI, the server and the tests.

use crate::aggregate::Snapshot;
use crate::record::{
    new_record_id, parse_amount_text, parse_occurred_at, Amount, Debt, DebtStatus, Entry, Expense,
    RecordKind, Sale,
};
use crate::schema::{describe, DebtDraft, ExpenseDraft, SaleDraft};
use anyhow::{anyhow, Context, Result};
use chrono::{FixedOffset, NaiveDateTime, Offset, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

// ============================================================================
// CHANGE NOTIFICATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    Inserted,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub kind: RecordKind,
    pub change: Change,
    pub id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Subscriber = Box<dyn Fn(&ChangeEvent) + Send + Sync>;

// ============================================================================
// STORE CONTRACT
// ============================================================================

pub trait RecordStore: Send + Sync {
    /// Sales, newest first
    fn list_sales(&self) -> Result<Vec<Sale>>;
    /// Expenses, newest first
    fn list_expenses(&self) -> Result<Vec<Expense>>;
    /// Debts, newest first
    fn list_debts(&self) -> Result<Vec<Debt>>;

    fn insert_sale(&self, draft: &SaleDraft) -> Result<Sale>;
    fn insert_expense(&self, draft: &ExpenseDraft) -> Result<Expense>;
    fn insert_debt(&self, draft: &DebtDraft) -> Result<Debt>;

    fn set_debt_status(&self, id: &str, status: DebtStatus) -> Result<Debt>;

    fn delete(&self, kind: RecordKind, id: &str) -> Result<()>;

    /// Register a callback invoked after every mutation
    fn subscribe(&self, subscriber: Subscriber) -> SubscriptionId;

    /// Returns false if the id was not registered
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Flip pending <-> paid
    fn toggle_debt_status(&self, id: &str) -> Result<Debt> {
        let current = self
            .list_debts()?
            .into_iter()
            .find(|d| d.id == id)
            .ok_or_else(|| anyhow!("Debt not found: {}", id))?;

        self.set_debt_status(id, current.status.toggled())
    }
}

/// Fetch all three lists. Any failure fails the whole snapshot, so a partial
/// view never reaches the aggregator.
pub fn fetch_snapshot(store: &dyn RecordStore) -> Result<Snapshot> {
    Ok(Snapshot {
        sales: store.list_sales().context("Failed to list sales")?,
        expenses: store.list_expenses().context("Failed to list expenses")?,
        debts: store.list_debts().context("Failed to list debts")?,
    })
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Debug, Default)]
struct Tables {
    sales: Vec<Sale>,
    expenses: Vec<Expense>,
    debts: Vec<Debt>,
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
    subscribers: Mutex<Vec<(SubscriptionId, Arc<dyn Fn(&ChangeEvent) + Send + Sync>)>>,
    next_subscription: AtomicU64,
    /// Shop-local offset used to order listings
    offset: FixedOffset,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::with_offset(Utc.fix())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Empty store whose listings order timestamps in `offset`
    pub fn with_offset(offset: FixedOffset) -> Self {
        MemoryStore {
            tables: RwLock::new(Tables::default()),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
            offset,
        }
    }

    /// Seed the store without emitting change events
    pub fn seeded(self, sales: Vec<Sale>, expenses: Vec<Expense>, debts: Vec<Debt>) -> Self {
        {
            let mut tables = self.write();
            tables.sales = sales;
            tables.expenses = expenses;
            tables.debts = debts;
        }
        self
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notify(&self, kind: RecordKind, change: Change, id: &str) {
        let event = ChangeEvent {
            kind,
            change,
            id: id.to_string(),
        };

        // Clone the list so callbacks may (un)subscribe without deadlocking
        let subscribers: Vec<_> = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        log::debug!(
            "{} {} {:?}, notifying {} subscriber(s)",
            kind.name(),
            id,
            change,
            subscribers.len()
        );

        for callback in subscribers {
            callback(&event);
        }
    }
}

/// Newest first in shop-local time; records with unparsable timestamps go last
fn newest_first<E: Entry + Clone>(entries: &[E], offset: FixedOffset) -> Vec<E> {
    let key = |e: &E| -> Option<NaiveDateTime> { parse_occurred_at(e.occurred_at(), offset) };
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| key(b).cmp(&key(a)));
    sorted
}

fn remove_by_id<E: Entry>(entries: &mut Vec<E>, id: &str) -> bool {
    let before = entries.len();
    entries.retain(|e| e.id() != id);
    entries.len() != before
}

impl RecordStore for MemoryStore {
    fn list_sales(&self) -> Result<Vec<Sale>> {
        Ok(newest_first(&self.read().sales, self.offset))
    }

    fn list_expenses(&self) -> Result<Vec<Expense>> {
        Ok(newest_first(&self.read().expenses, self.offset))
    }

    fn list_debts(&self) -> Result<Vec<Debt>> {
        Ok(newest_first(&self.read().debts, self.offset))
    }

    fn insert_sale(&self, draft: &SaleDraft) -> Result<Sale> {
        draft
            .validate()
            .map_err(|errors| anyhow!("Invalid sale: {}", describe(&errors)))?;

        let sale = Sale {
            id: new_record_id(),
            amount: Amount::Number(parse_amount_text(&draft.amount)),
            occurred_at: draft.occurred_at.trim().to_string(),
            notes: draft.normalized_notes(),
        };

        self.write().sales.push(sale.clone());
        log::info!("Recorded sale {} ({:.2})", sale.id, sale.amount.value());
        self.notify(RecordKind::Sale, Change::Inserted, &sale.id);
        Ok(sale)
    }

    fn insert_expense(&self, draft: &ExpenseDraft) -> Result<Expense> {
        draft
            .validate()
            .map_err(|errors| anyhow!("Invalid expense: {}", describe(&errors)))?;

        let expense = Expense {
            id: new_record_id(),
            amount: Amount::Number(parse_amount_text(&draft.amount)),
            occurred_at: draft.occurred_at.trim().to_string(),
            description: draft.description.trim().to_string(),
        };

        self.write().expenses.push(expense.clone());
        log::info!("Recorded expense {} ({:.2})", expense.id, expense.amount.value());
        self.notify(RecordKind::Expense, Change::Inserted, &expense.id);
        Ok(expense)
    }

    fn insert_debt(&self, draft: &DebtDraft) -> Result<Debt> {
        draft
            .validate()
            .map_err(|errors| anyhow!("Invalid debt: {}", describe(&errors)))?;

        let debt = Debt {
            id: new_record_id(),
            buyer: draft.buyer.trim().to_string(),
            amount: Amount::Number(parse_amount_text(&draft.amount)),
            occurred_at: draft.occurred_at.trim().to_string(),
            status: draft.initial_status(),
        };

        self.write().debts.push(debt.clone());
        log::info!("Recorded debt {} for {}", debt.id, debt.buyer);
        self.notify(RecordKind::Debt, Change::Inserted, &debt.id);
        Ok(debt)
    }

    fn set_debt_status(&self, id: &str, status: DebtStatus) -> Result<Debt> {
        let updated = {
            let mut tables = self.write();
            let debt = tables
                .debts
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| anyhow!("Debt not found: {}", id))?;
            debt.status = status;
            debt.clone()
        };

        log::info!("Debt {} marked {}", id, status.as_str());
        self.notify(RecordKind::Debt, Change::Updated, id);
        Ok(updated)
    }

    fn delete(&self, kind: RecordKind, id: &str) -> Result<()> {
        let removed = {
            let mut tables = self.write();
            match kind {
                RecordKind::Sale => remove_by_id(&mut tables.sales, id),
                RecordKind::Expense => remove_by_id(&mut tables.expenses, id),
                RecordKind::Debt => remove_by_id(&mut tables.debts, id),
            }
        };

        if !removed {
            return Err(anyhow!("No {} with id {}", kind.name(), id));
        }

        log::info!("Deleted {} {}", kind.name(), id);
        self.notify(kind, Change::Deleted, id);
        Ok(())
    }

    fn subscribe(&self, subscriber: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, Arc::from(subscriber)));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }
}
