// Shop Ledger - Core Library
// Sales, expenses and debts for a single shop, plus the time-bucket
// aggregation behind the dashboard charts. Used by the CLI, the API server
// and the tests.

pub mod aggregate;
pub mod buckets;
pub mod config;
pub mod csv_io;
pub mod host;
pub mod record;
pub mod report;
pub mod schema;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use aggregate::{
    Aggregator, BalanceSign, Breakdown, BucketSummary, Dashboard, GlobalTotals, Snapshot, Totals,
    bucket_sum, pending_debt_total, total_amount,
};
pub use buckets::{
    Bucket, BucketKey, Granularity, LabelSet,
    buckets_for, daily_buckets, days_in_month, hourly_buckets, monthly_buckets, weekday_buckets,
};
pub use config::AppConfig;
pub use host::DashboardHost;
pub use record::{
    Amount, Debt, DebtStatus, Entry, Expense, MonetaryRecord, RecordKind, Sale,
    parse_amount_text, parse_occurred_at, partition_debts, to_monetary,
};
pub use schema::{DebtDraft, ExpenseDraft, SaleDraft, ValidationError, ValidationResult};
pub use session::{CredentialGate, Session, SessionHolder};
pub use store::{
    Change, ChangeEvent, MemoryStore, RecordStore, Subscriber, SubscriptionId, fetch_snapshot,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
