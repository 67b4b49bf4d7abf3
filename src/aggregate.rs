// 📊 Time-Bucket Aggregator
//
// Pure functions from (sales, expenses, now) to chart data. Nothing is
// cached: every call recomputes from the full lists it is handed.

use crate::buckets::{buckets_for, Bucket, Granularity, LabelSet};
use crate::config::AppConfig;
use crate::record::{to_monetary, Debt, Entry, Expense, MonetaryRecord, Sale};
use chrono::{FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// OUTPUT TYPES
// ============================================================================

/// One chart bar pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub label: String,
    pub sale_sum: f64,
    pub expense_sum: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceSign {
    /// Zero counts as positive
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub total_sales: f64,
    pub total_expenses: f64,
    pub balance: f64,
}

impl Totals {
    pub fn new(total_sales: f64, total_expenses: f64) -> Self {
        Totals {
            total_sales,
            total_expenses,
            balance: total_sales - total_expenses,
        }
    }

    /// Sum the bucket columns of a breakdown
    pub fn from_buckets(buckets: &[BucketSummary]) -> Self {
        let total_sales = sum(buckets.iter().map(|b| b.sale_sum));
        let total_expenses = sum(buckets.iter().map(|b| b.expense_sum));
        Totals::new(total_sales, total_expenses)
    }

    pub fn sign(&self) -> BalanceSign {
        if self.balance < 0.0 {
            BalanceSign::Negative
        } else {
            BalanceSign::Positive
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub granularity: Granularity,
    pub buckets: Vec<BucketSummary>,
    pub totals: Totals,
}

/// Un-bucketed summary over the full record lists
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalTotals {
    pub total_sales: f64,
    pub total_expenses: f64,
    pub pending_debts: f64,
    pub balance: f64,
}

impl GlobalTotals {
    pub fn sign(&self) -> BalanceSign {
        if self.balance < 0.0 {
            BalanceSign::Negative
        } else {
            BalanceSign::Positive
        }
    }
}

/// Complete record lists as fetched from the store in one go
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub sales: Vec<Sale>,
    pub expenses: Vec<Expense>,
    pub debts: Vec<Debt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub generated_at: NaiveDateTime,
    pub totals: GlobalTotals,
    pub monthly: Breakdown,
    pub daily: Breakdown,
    pub hourly: Breakdown,
    pub weekday: Breakdown,
}

impl Dashboard {
    pub fn breakdown(&self, granularity: Granularity) -> &Breakdown {
        match granularity {
            Granularity::Monthly => &self.monthly,
            Granularity::Daily => &self.daily,
            Granularity::Hourly => &self.hourly,
            Granularity::Weekday => &self.weekday,
        }
    }
}

// ============================================================================
// SUMMATION
// ============================================================================

/// Seeded with `+0.0`; `Iterator::sum` over no floats yields `-0.0`
fn sum(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc, value| acc + value)
}

/// Sum of every amount, timestamps ignored
pub fn total_amount(records: &[MonetaryRecord]) -> f64 {
    sum(records.iter().map(|r| r.amount))
}

/// Sum of amounts whose timestamp falls in `bucket`.
/// Records without a usable timestamp never match.
pub fn bucket_sum(records: &[MonetaryRecord], bucket: &Bucket) -> f64 {
    let matching = records
        .iter()
        .filter(|r| r.occurred_at.map_or(false, |at| bucket.key.contains(&at)))
        .map(|r| r.amount);
    sum(matching)
}

pub fn pending_debt_total(debts: &[Debt]) -> f64 {
    let pending = debts
        .iter()
        .filter(|d| d.is_pending())
        .map(|d| d.amount().value());
    sum(pending)
}

// ============================================================================
// AGGREGATOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregator {
    monthly_window: usize,
    labels: LabelSet,
}

impl Default for Aggregator {
    fn default() -> Self {
        Aggregator::new(12, LabelSet::En)
    }
}

impl Aggregator {
    pub fn new(monthly_window: usize, labels: LabelSet) -> Self {
        Aggregator {
            monthly_window,
            labels,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Aggregator::new(config.monthly_window, config.labels)
    }

    pub fn monthly_window(&self) -> usize {
        self.monthly_window
    }

    /// Bucketed sale/expense sums for one granularity
    pub fn breakdown(
        &self,
        granularity: Granularity,
        sales: &[MonetaryRecord],
        expenses: &[MonetaryRecord],
        now: NaiveDateTime,
    ) -> Breakdown {
        let buckets: Vec<BucketSummary> =
            buckets_for(granularity, now, self.monthly_window, self.labels)
                .iter()
                .map(|bucket| BucketSummary {
                    label: bucket.label.clone(),
                    sale_sum: bucket_sum(sales, bucket),
                    expense_sum: bucket_sum(expenses, bucket),
                })
                .collect();

        let totals = Totals::from_buckets(&buckets);

        Breakdown {
            granularity,
            buckets,
            totals,
        }
    }

    pub fn global_totals(
        &self,
        sales: &[MonetaryRecord],
        expenses: &[MonetaryRecord],
        debts: &[Debt],
    ) -> GlobalTotals {
        let total_sales = total_amount(sales);
        let total_expenses = total_amount(expenses);
        GlobalTotals {
            total_sales,
            total_expenses,
            pending_debts: pending_debt_total(debts),
            balance: total_sales - total_expenses,
        }
    }

    /// Global totals plus all four breakdowns for one snapshot
    pub fn dashboard(
        &self,
        snapshot: &Snapshot,
        offset: FixedOffset,
        now: NaiveDateTime,
    ) -> Dashboard {
        let sales = to_monetary(&snapshot.sales, offset);
        let expenses = to_monetary(&snapshot.expenses, offset);

        Dashboard {
            generated_at: now,
            totals: self.global_totals(&sales, &expenses, &snapshot.debts),
            monthly: self.breakdown(Granularity::Monthly, &sales, &expenses, now),
            daily: self.breakdown(Granularity::Daily, &sales, &expenses, now),
            hourly: self.breakdown(Granularity::Hourly, &sales, &expenses, now),
            weekday: self.breakdown(Granularity::Weekday, &sales, &expenses, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Amount, DebtStatus};
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 30, 0)
            .unwrap()
    }

    fn rec(amount: f64, y: i32, m: u32, d: u32, h: u32) -> MonetaryRecord {
        MonetaryRecord::new(amount, at(y, m, d, h))
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn debt(amount: f64, status: DebtStatus) -> Debt {
        Debt {
            id: uuid::Uuid::new_v4().to_string(),
            buyer: "Luis".to_string(),
            amount: Amount::Number(amount),
            occurred_at: "2024-03-05".to_string(),
            status,
        }
    }

    /// Records spread over several years, days, hours and weekdays
    fn sample() -> (Vec<MonetaryRecord>, Vec<MonetaryRecord>) {
        let sales = vec![
            rec(100.0, 2024, 3, 5, 9),
            rec(25.5, 2024, 3, 5, 14),
            rec(10.0, 2024, 3, 17, 20),
            rec(60.0, 2024, 1, 2, 11),
            rec(7.25, 2023, 11, 30, 8),
            rec(12.0, 2023, 3, 5, 9),
        ];
        let expenses = vec![
            rec(40.0, 2024, 3, 5, 9),
            rec(15.0, 2024, 3, 10, 18),
            rec(80.0, 2023, 6, 1, 7),
        ];
        (sales, expenses)
    }

    #[test]
    fn test_example_single_sale_and_expense() {
        let aggregator = Aggregator::default();
        let now = at(2024, 3, 20, 12);
        let sales = vec![rec(100.0, 2024, 3, 5, 10)];
        let expenses = vec![rec(40.0, 2024, 3, 5, 10)];

        let monthly = aggregator.breakdown(Granularity::Monthly, &sales, &expenses, now);
        let march = monthly.buckets.iter().find(|b| b.label == "Mar").unwrap();
        assert_eq!(march.sale_sum, 100.0);
        assert_eq!(march.expense_sum, 40.0);

        let totals = aggregator.global_totals(&sales, &expenses, &[]);
        assert_eq!(totals.total_sales, 100.0);
        assert_eq!(totals.total_expenses, 40.0);
        assert_eq!(totals.balance, 60.0);

        println!("✅ Single sale/expense example PASSED");
    }

    #[test]
    fn test_pending_debt_total_ignores_paid() {
        let debts = vec![debt(50.0, DebtStatus::Pending), debt(30.0, DebtStatus::Paid)];
        assert_eq!(pending_debt_total(&debts), 50.0);

        let totals = Aggregator::default().global_totals(&[], &[], &debts);
        assert_eq!(totals.pending_debts, 50.0);
        assert_eq!(totals.balance, 0.0);
    }

    #[test]
    fn test_sunday_lands_last_in_weekday_view() {
        // 2024-03-10 is a Sunday
        let sales = vec![rec(9.0, 2024, 3, 10, 10)];
        let weekday =
            Aggregator::default().breakdown(Granularity::Weekday, &sales, &[], at(2024, 3, 20, 0));

        assert_eq!(weekday.buckets.len(), 7);
        assert_eq!(weekday.buckets[6].label, "Sun");
        assert_eq!(weekday.buckets[6].sale_sum, 9.0);
        assert_eq!(weekday.buckets[0].label, "Mon");
        assert_eq!(weekday.buckets[0].sale_sum, 0.0);
    }

    #[test]
    fn test_conservation_per_granularity() {
        let aggregator = Aggregator::default();
        let (sales, expenses) = sample();
        let now = at(2024, 3, 5, 15);

        // Monthly (12) and weekday views cover every dated record
        for granularity in [Granularity::Monthly, Granularity::Weekday] {
            let breakdown = aggregator.breakdown(granularity, &sales, &expenses, now);
            assert_eq!(breakdown.totals.total_sales, total_amount(&sales), "{:?}", granularity);
            assert_eq!(
                breakdown.totals.total_expenses,
                total_amount(&expenses),
                "{:?}",
                granularity
            );
        }

        // Daily covers March 2024 only
        let daily = aggregator.breakdown(Granularity::Daily, &sales, &expenses, now);
        assert_eq!(daily.totals.total_sales, 135.5);
        assert_eq!(daily.totals.total_expenses, 55.0);

        // Hourly covers 2024-03-05 only
        let hourly = aggregator.breakdown(Granularity::Hourly, &sales, &expenses, now);
        assert_eq!(hourly.totals.total_sales, 125.5);
        assert_eq!(hourly.buckets[9].sale_sum, 100.0);
        assert_eq!(hourly.buckets[14].sale_sum, 25.5);
        assert_eq!(hourly.buckets[9].expense_sum, 40.0);
    }

    #[test]
    fn test_monthly_cross_year_collision_is_preserved() {
        // March 2023 and March 2024 share the "Mar" bucket
        let (sales, expenses) = sample();
        let monthly = Aggregator::default().breakdown(
            Granularity::Monthly,
            &sales,
            &expenses,
            at(2024, 3, 20, 0),
        );
        let march = monthly.buckets.iter().find(|b| b.label == "Mar").unwrap();
        assert_eq!(march.sale_sum, 100.0 + 25.5 + 10.0 + 12.0);
    }

    #[test]
    fn test_six_month_window_drops_older_months() {
        let (sales, expenses) = sample();
        let monthly = Aggregator::new(6, LabelSet::En).breakdown(
            Granularity::Monthly,
            &sales,
            &expenses,
            at(2024, 3, 20, 0),
        );
        assert_eq!(monthly.buckets.len(), 6);
        assert_eq!(monthly.buckets[0].label, "Oct");
        // June expense falls outside Oct..Mar
        assert_eq!(monthly.totals.total_expenses, 55.0);
    }

    #[test]
    fn test_negative_balance() {
        let sales = vec![rec(10.0, 2024, 3, 5, 9)];
        let expenses = vec![rec(35.0, 2024, 3, 6, 9)];
        let daily = Aggregator::default().breakdown(
            Granularity::Daily,
            &sales,
            &expenses,
            at(2024, 3, 20, 0),
        );

        assert_eq!(daily.totals.balance, -25.0);
        assert_eq!(daily.totals.sign(), BalanceSign::Negative);
        assert_eq!(Totals::new(5.0, 5.0).sign(), BalanceSign::Positive);
    }

    #[test]
    fn test_empty_buckets_report_zero() {
        let aggregator = Aggregator::default();
        let daily = aggregator.breakdown(Granularity::Daily, &[], &[], at(2024, 2, 1, 0));
        assert_eq!(daily.buckets.len(), 29);
        assert!(daily.buckets.iter().all(|b| b.sale_sum == 0.0 && b.expense_sum == 0.0));
        assert_eq!(daily.totals, Totals::new(0.0, 0.0));
    }

    #[test]
    fn test_empty_sums_are_positive_zero() {
        let aggregator = Aggregator::default();
        let hourly = aggregator.breakdown(Granularity::Hourly, &[], &[], at(2024, 3, 5, 0));
        assert!(hourly
            .buckets
            .iter()
            .all(|b| b.sale_sum.is_sign_positive() && b.expense_sum.is_sign_positive()));
        assert!(hourly.totals.total_sales.is_sign_positive());
        assert!(hourly.totals.balance.is_sign_positive());

        let totals = aggregator.global_totals(&[], &[], &[]);
        assert!(totals.total_sales.is_sign_positive());
        assert!(totals.pending_debts.is_sign_positive());

        let json = serde_json::to_string(&hourly.buckets[0]).unwrap();
        assert!(!json.contains("-0.0"), "{}", json);
    }

    #[test]
    fn test_undated_records_excluded_from_buckets() {
        let sales = vec![
            rec(10.0, 2024, 3, 5, 9),
            MonetaryRecord {
                amount: 99.0,
                occurred_at: None,
            },
        ];
        let aggregator = Aggregator::default();
        let now = at(2024, 3, 20, 0);

        for granularity in Granularity::ALL {
            let breakdown = aggregator.breakdown(granularity, &sales, &[], now);
            assert!(breakdown.totals.total_sales <= 10.0, "{:?}", granularity);
        }
        assert_eq!(aggregator.global_totals(&sales, &[], &[]).total_sales, 109.0);
    }

    #[test]
    fn test_dashboard_is_idempotent() {
        let snapshot = Snapshot {
            sales: vec![Sale {
                id: "s1".to_string(),
                amount: Amount::Text("100".to_string()),
                occurred_at: "2024-03-05T10:00:00".to_string(),
                notes: None,
            }],
            expenses: vec![Expense {
                id: "e1".to_string(),
                amount: Amount::Number(40.0),
                occurred_at: "2024-03-05".to_string(),
                description: "Rent".to_string(),
            }],
            debts: vec![debt(50.0, DebtStatus::Pending)],
        };
        let aggregator = Aggregator::default();
        let now = at(2024, 3, 5, 18);

        let first = aggregator.dashboard(&snapshot, utc(), now);
        let second = aggregator.dashboard(&snapshot, utc(), now);
        assert_eq!(first, second);

        assert_eq!(first.totals.balance, 60.0);
        assert_eq!(first.totals.pending_debts, 50.0);
        assert_eq!(first.breakdown(Granularity::Hourly).buckets[10].sale_sum, 100.0);
        assert_eq!(first.breakdown(Granularity::Hourly).buckets[0].expense_sum, 40.0);
        assert_eq!(first.monthly.buckets.len(), 12);
        assert_eq!(first.daily.buckets.len(), 31);
        assert_eq!(first.hourly.buckets.len(), 24);
        assert_eq!(first.weekday.buckets.len(), 7);
    }
}
