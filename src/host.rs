// 🖥️ Dashboard Host - Drives the aggregator from store snapshots
//
// Triggers (first load, manual refresh, change notification) each fetch a
// full snapshot and recompute. A refresh that finishes after a newer one has
// already published is dropped.

use crate::aggregate::{Aggregator, Dashboard};
use crate::config::AppConfig;
use crate::record::{Debt, DebtStatus, Expense, RecordKind, Sale};
use crate::schema::{DebtDraft, ExpenseDraft, SaleDraft};
use crate::session::Session;
use crate::store::{fetch_snapshot, ChangeEvent, RecordStore, SubscriptionId};
use anyhow::{Context, Result};
use chrono::{FixedOffset, NaiveDateTime};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub struct DashboardHost {
    store: Arc<dyn RecordStore>,
    aggregator: Aggregator,
    offset: FixedOffset,
    dirty: Arc<AtomicBool>,
    tickets: AtomicU64,
    published: Mutex<Option<(u64, Dashboard)>>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl DashboardHost {
    pub fn new(store: Arc<dyn RecordStore>, aggregator: Aggregator, offset: FixedOffset) -> Self {
        DashboardHost {
            store,
            aggregator,
            offset,
            dirty: Arc::new(AtomicBool::new(true)),
            tickets: AtomicU64::new(0),
            published: Mutex::new(None),
            subscription: Mutex::new(None),
        }
    }

    pub fn from_config(store: Arc<dyn RecordStore>, config: &AppConfig) -> Result<Self> {
        Ok(DashboardHost::new(
            store,
            Aggregator::from_config(config),
            config.offset()?,
        ))
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Start listening for store changes. Calling twice keeps one subscription.
    pub fn attach(&self) -> SubscriptionId {
        let mut subscription = self
            .subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(id) = *subscription {
            return id;
        }

        let dirty = Arc::clone(&self.dirty);
        let id = self.store.subscribe(Box::new(move |event: &ChangeEvent| {
            log::debug!("{} {:?}, dashboard marked stale", event.kind.name(), event.change);
            dirty.store(true, Ordering::SeqCst);
        }));
        *subscription = Some(id);
        id
    }

    pub fn detach(&self) {
        let mut subscription = self
            .subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(id) = subscription.take() {
            self.store.unsubscribe(id);
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Fetch a fresh snapshot and recompute. Returns `None` when a newer
    /// refresh published first.
    pub fn refresh(&self, session: &Session, now: NaiveDateTime) -> Result<Option<Dashboard>> {
        session.require_authenticated()?;

        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        self.dirty.store(false, Ordering::SeqCst);

        let snapshot = match fetch_snapshot(self.store.as_ref()) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.dirty.store(true, Ordering::SeqCst);
                return Err(e).context("Dashboard refresh failed");
            }
        };

        let dashboard = self.aggregator.dashboard(&snapshot, self.offset, now);
        Ok(self.publish(ticket, dashboard))
    }

    /// Refresh only if a change arrived since the last refresh
    pub fn refresh_if_dirty(
        &self,
        session: &Session,
        now: NaiveDateTime,
    ) -> Result<Option<Dashboard>> {
        if !self.is_dirty() {
            return Ok(None);
        }
        self.refresh(session, now)
    }

    /// Latest dashboard, recomputed first if stale, never built, or built on
    /// another calendar day than `now`
    pub fn current(&self, session: &Session, now: NaiveDateTime) -> Result<Dashboard> {
        session.require_authenticated()?;

        if !self.is_dirty() {
            // Hourly and daily windows (and so the monthly one) move with the date
            if let Some(dashboard) = self
                .latest()
                .filter(|cached| cached.generated_at.date() == now.date())
            {
                return Ok(dashboard);
            }
        }

        match self.refresh(session, now)? {
            Some(dashboard) => Ok(dashboard),
            // Lost the race to a newer refresh; its result is at least as fresh
            None => self
                .latest()
                .context("Dashboard refresh produced no result"),
        }
    }

    pub fn latest(&self) -> Option<Dashboard> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|(_, dashboard)| dashboard.clone())
    }

    fn publish(&self, ticket: u64, dashboard: Dashboard) -> Option<Dashboard> {
        let mut published = self
            .published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some((newest, _)) = published.as_ref() {
            if *newest > ticket {
                log::debug!("Discarding stale refresh #{} (already have #{})", ticket, newest);
                return None;
            }
        }

        log::debug!("Published dashboard refresh #{}", ticket);
        *published = Some((ticket, dashboard.clone()));
        Some(dashboard)
    }

    // ========================================================================
    // RECORD ENTRY (session-gated)
    // ========================================================================

    pub fn record_sale(&self, session: &Session, draft: &SaleDraft) -> Result<Sale> {
        session.require_authenticated()?;
        self.store.insert_sale(draft)
    }

    pub fn record_expense(&self, session: &Session, draft: &ExpenseDraft) -> Result<Expense> {
        session.require_authenticated()?;
        self.store.insert_expense(draft)
    }

    pub fn record_debt(&self, session: &Session, draft: &DebtDraft) -> Result<Debt> {
        session.require_authenticated()?;
        self.store.insert_debt(draft)
    }

    pub fn toggle_debt(&self, session: &Session, id: &str) -> Result<Debt> {
        session.require_authenticated()?;
        self.store.toggle_debt_status(id)
    }

    pub fn set_debt_status(&self, session: &Session, id: &str, status: DebtStatus) -> Result<Debt> {
        session.require_authenticated()?;
        self.store.set_debt_status(id, status)
    }

    pub fn delete(&self, session: &Session, kind: RecordKind, id: &str) -> Result<()> {
        session.require_authenticated()?;
        self.store.delete(kind, id)
    }
}

impl Drop for DashboardHost {
    fn drop(&mut self) {
        self.detach();
    }
}
