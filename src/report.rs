// 🖨️ Text Report - Dashboard as plain tables for the terminal

use crate::aggregate::{BalanceSign, Breakdown, Dashboard};
use crate::buckets::Granularity;
use crate::record::{partition_debts, Debt, Entry};

fn sign_tag(sign: BalanceSign) -> &'static str {
    match sign {
        BalanceSign::Positive => "positive",
        BalanceSign::Negative => "NEGATIVE",
    }
}

pub fn format_money(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", -value)
    } else {
        // abs() folds -0.0 into 0.0
        format!("${:.2}", value.abs())
    }
}

fn title(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Monthly => "Monthly",
        Granularity::Daily => "Days of this month",
        Granularity::Hourly => "Hours of today",
        Granularity::Weekday => "Weekdays (Mon-Sun)",
    }
}

fn row(label: &str, sales: f64, expenses: f64) -> String {
    format!(
        "{:<8} {:>12} {:>12}\n",
        label,
        format_money(sales),
        format_money(expenses)
    )
}

pub fn render_breakdown(breakdown: &Breakdown) -> String {
    let mut out = format!("── {} ──\n", title(breakdown.granularity));
    out.push_str(&format!("{:<8} {:>12} {:>12}\n", "", "Sales", "Expenses"));

    for bucket in &breakdown.buckets {
        out.push_str(&row(&bucket.label, bucket.sale_sum, bucket.expense_sum));
    }

    let totals = &breakdown.totals;
    out.push_str(&row("Total", totals.total_sales, totals.total_expenses));
    out.push_str(&format!(
        "Balance: {} ({})\n",
        format_money(totals.balance),
        sign_tag(totals.sign())
    ));
    out
}

pub fn render_dashboard(dashboard: &Dashboard, user_label: &str) -> String {
    let totals = &dashboard.totals;

    let mut out = format!(
        "Dashboard {}\nUser: {}\n\n",
        dashboard.generated_at.format("%Y-%m-%d %H:%M"),
        user_label
    );
    out.push_str(&format!("Total sales:     {}\n", format_money(totals.total_sales)));
    out.push_str(&format!("Total expenses:  {}\n", format_money(totals.total_expenses)));
    out.push_str(&format!("Pending debts:   {}\n", format_money(totals.pending_debts)));
    out.push_str(&format!(
        "Balance:         {} ({})\n",
        format_money(totals.balance),
        sign_tag(totals.sign())
    ));

    for granularity in Granularity::ALL {
        out.push('\n');
        out.push_str(&render_breakdown(dashboard.breakdown(granularity)));
    }

    out
}

pub fn render_debts(debts: &[Debt]) -> String {
    let (pending, paid) = partition_debts(debts);
    let mut out = String::new();

    for (heading, list) in [("Pending", pending), ("Paid", paid)] {
        out.push_str(&format!("── {} ({}) ──\n", heading, list.len()));
        for debt in list {
            out.push_str(&format!(
                "{}  {:<20} {:>12}  {}\n",
                debt.id,
                debt.buyer,
                format_money(debt.amount().value()),
                debt.occurred_at
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Aggregator, BucketSummary, Snapshot, Totals};
    use crate::record::{Amount, DebtStatus};
    use chrono::FixedOffset;

    #[test]
    fn test_negative_balance_rendered_distinctly() {
        let breakdown = Breakdown {
            granularity: Granularity::Hourly,
            buckets: vec![BucketSummary {
                label: "9:00".to_string(),
                sale_sum: 10.0,
                expense_sum: 35.5,
            }],
            totals: Totals::new(10.0, 35.5),
        };

        let text = render_breakdown(&breakdown);
        assert!(text.contains("Balance: -$25.50 (NEGATIVE)"), "{}", text);
        assert!(text.contains("9:00"));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(60.0), "$60.00");
        assert_eq!(format_money(-0.5), "-$0.50");
        assert_eq!(format_money(-0.0), "$0.00");
    }

    #[test]
    fn test_empty_breakdown_renders_plain_zero() {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let aggregator = Aggregator::default();
        let breakdown = aggregator.breakdown(Granularity::Hourly, &[], &[], now);

        let text = render_breakdown(&breakdown);
        assert!(!text.contains("$-0.00"), "{}", text);
        assert!(!text.contains("-$0.00"), "{}", text);
        assert!(text.contains("Balance: $0.00 (positive)"), "{}", text);

        let utc = FixedOffset::east_opt(0).unwrap();
        let dashboard = aggregator.dashboard(&Snapshot::default(), utc, now);
        let text = render_dashboard(&dashboard, "caja");
        assert!(text.contains("Pending debts:   $0.00"), "{}", text);
        assert!(!text.contains("-0.00"), "{}", text);
    }

    #[test]
    fn test_render_debts_groups_by_status() {
        let debts = vec![Debt {
            id: "d1".to_string(),
            buyer: "Ana".to_string(),
            amount: Amount::Number(50.0),
            occurred_at: "2024-03-05".to_string(),
            status: DebtStatus::Paid,
        }];
        let text = render_debts(&debts);
        assert!(text.contains("Pending (0)"));
        assert!(text.contains("Paid (1)"));
        assert!(text.contains("$50.00"));
    }
}
