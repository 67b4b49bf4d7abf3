// 🧾 Records - Sales, Expenses, Debts
// Raw rows as the record store hands them out, plus the permissive
// amount/timestamp parsing the aggregator relies on.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// RECORD KINDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Sale,
    Expense,
    Debt,
}

impl RecordKind {
    pub fn name(&self) -> &str {
        match self {
            RecordKind::Sale => "sale",
            RecordKind::Expense => "expense",
            RecordKind::Debt => "debt",
        }
    }

    /// Parse a kind name (singular or plural, case-insensitive)
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "sale" | "sales" => Some(RecordKind::Sale),
            "expense" | "expenses" => Some(RecordKind::Expense),
            "debt" | "debts" => Some(RecordKind::Debt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtStatus {
    Pending,
    Paid,
}

impl DebtStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DebtStatus::Pending => "pending",
            DebtStatus::Paid => "paid",
        }
    }

    /// Accepts the English names and the legacy Spanish ones
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "pending" | "pendiente" => Some(DebtStatus::Pending),
            "paid" | "pagado" => Some(DebtStatus::Paid),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            DebtStatus::Pending => DebtStatus::Paid,
            DebtStatus::Paid => DebtStatus::Pending,
        }
    }
}

// ============================================================================
// AMOUNT
// ============================================================================

/// Amount as stored: either a number or the text it was typed as
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    /// Numeric value; anything unparsable counts as zero
    pub fn value(&self) -> f64 {
        match self {
            Amount::Number(n) if n.is_finite() => *n,
            Amount::Number(_) => 0.0,
            Amount::Text(text) => parse_amount_text(text),
        }
    }

    /// Text form used for CSV columns
    pub fn to_text(&self) -> String {
        match self {
            Amount::Number(n) => n.to_string(),
            Amount::Text(text) => text.clone(),
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::Text(String::new())
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Number(value)
    }
}

/// Parse the longest leading decimal prefix of `text`.
///
/// `"12.5abc"` → 12.5, `"  7"` → 7, `"abc"` / `""` → 0. Exponents are
/// honoured only when followed by digits (`"1e3"` → 1000, `"1e"` → 1).
pub fn parse_amount_text(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let mut mantissa_digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        mantissa_digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            mantissa_digits += 1;
        }
    }

    if mantissa_digits == 0 {
        return 0.0;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    match trimmed[..end].parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

// ============================================================================
// TIMESTAMPS
// ============================================================================

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a record timestamp into shop-local wall-clock time.
///
/// Offset-carrying RFC 3339 values are converted to `offset`; naive values
/// are taken as already local. A bare date means midnight. Returns `None`
/// for anything else.
pub fn parse_occurred_at(text: &str, offset: FixedOffset) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&offset).naive_local());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

// ============================================================================
// MONETARY RECORD (aggregator input)
// ============================================================================

/// The only shape the aggregator sees: a parsed amount and a local timestamp.
/// `occurred_at == None` means the source timestamp was unparsable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonetaryRecord {
    pub amount: f64,
    pub occurred_at: Option<NaiveDateTime>,
}

impl MonetaryRecord {
    pub fn new(amount: f64, occurred_at: NaiveDateTime) -> Self {
        MonetaryRecord {
            amount,
            occurred_at: Some(occurred_at),
        }
    }
}

/// Common view over the three stored record kinds
pub trait Entry {
    fn id(&self) -> &str;
    fn amount(&self) -> &Amount;
    fn occurred_at(&self) -> &str;

    fn monetary(&self, offset: FixedOffset) -> MonetaryRecord {
        MonetaryRecord {
            amount: self.amount().value(),
            occurred_at: parse_occurred_at(self.occurred_at(), offset),
        }
    }
}

/// Convert a list of stored entries into aggregator input
pub fn to_monetary<E: Entry>(entries: &[E], offset: FixedOffset) -> Vec<MonetaryRecord> {
    entries.iter().map(|e| e.monetary(offset)).collect()
}

// ============================================================================
// STORED RECORDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    #[serde(default)]
    pub amount: Amount,
    pub occurred_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    #[serde(default)]
    pub amount: Amount,
    pub occurred_at: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub id: String,
    pub buyer: String,
    #[serde(default)]
    pub amount: Amount,
    pub occurred_at: String,
    pub status: DebtStatus,
}

impl Debt {
    pub fn is_pending(&self) -> bool {
        self.status == DebtStatus::Pending
    }
}

impl Entry for Sale {
    fn id(&self) -> &str {
        &self.id
    }
    fn amount(&self) -> &Amount {
        &self.amount
    }
    fn occurred_at(&self) -> &str {
        &self.occurred_at
    }
}

impl Entry for Expense {
    fn id(&self) -> &str {
        &self.id
    }
    fn amount(&self) -> &Amount {
        &self.amount
    }
    fn occurred_at(&self) -> &str {
        &self.occurred_at
    }
}

impl Entry for Debt {
    fn id(&self) -> &str {
        &self.id
    }
    fn amount(&self) -> &Amount {
        &self.amount
    }
    fn occurred_at(&self) -> &str {
        &self.occurred_at
    }
}

/// Split debts into (pending, paid), keeping the input order
pub fn partition_debts(debts: &[Debt]) -> (Vec<&Debt>, Vec<&Debt>) {
    debts.iter().partition(|d| d.is_pending())
}

pub(crate) fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_parse_amount_text_permissive() {
        assert_eq!(parse_amount_text("100"), 100.0);
        assert_eq!(parse_amount_text("  12.5abc"), 12.5);
        assert_eq!(parse_amount_text(".5"), 0.5);
        assert_eq!(parse_amount_text("1e3"), 1000.0);
        assert_eq!(parse_amount_text("1e"), 1.0);
        assert_eq!(parse_amount_text("abc"), 0.0, "Non-numeric text is zero");
        assert_eq!(parse_amount_text(""), 0.0, "Empty text is zero");
        assert_eq!(parse_amount_text("-"), 0.0);
    }

    #[test]
    fn test_amount_value() {
        assert_eq!(Amount::Number(40.0).value(), 40.0);
        assert_eq!(Amount::Number(f64::NAN).value(), 0.0);
        assert_eq!(Amount::Text("30".to_string()).value(), 30.0);
        assert_eq!(Amount::default().value(), 0.0, "Missing amount is zero");
    }

    #[test]
    fn test_amount_deserializes_number_or_text() {
        let number: Amount = serde_json::from_str("12.5").unwrap();
        let text: Amount = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(number, Amount::Number(12.5));
        assert_eq!(text, Amount::Text("12.5".to_string()));
        assert_eq!(number.value(), text.value());
    }

    #[test]
    fn test_parse_occurred_at_forms() {
        let date_only = parse_occurred_at("2024-03-05", utc()).unwrap();
        assert_eq!(date_only.to_string(), "2024-03-05 00:00:00");

        let naive = parse_occurred_at("2024-03-05T14:30:00", utc()).unwrap();
        assert_eq!(naive.hour(), 14);

        let spaced = parse_occurred_at("2024-03-05 09:15", utc()).unwrap();
        assert_eq!(spaced.minute(), 15);

        assert!(parse_occurred_at("not a date", utc()).is_none());
        assert!(parse_occurred_at("", utc()).is_none());
    }

    #[test]
    fn test_rfc3339_converted_to_local_offset() {
        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        let local = parse_occurred_at("2024-03-05T02:00:00Z", minus_five).unwrap();
        assert_eq!(local.to_string(), "2024-03-04 21:00:00");
    }

    #[test]
    fn test_debt_status_parse_and_toggle() {
        assert_eq!(DebtStatus::parse("pendiente"), Some(DebtStatus::Pending));
        assert_eq!(DebtStatus::parse("Paid"), Some(DebtStatus::Paid));
        assert_eq!(DebtStatus::parse("unknown"), None);
        assert_eq!(DebtStatus::Pending.toggled(), DebtStatus::Paid);
        assert_eq!(DebtStatus::Paid.toggled(), DebtStatus::Pending);
    }

    #[test]
    fn test_monetary_view_of_unparsable_timestamp() {
        let sale = Sale {
            id: "s1".to_string(),
            amount: Amount::Text("25".to_string()),
            occurred_at: "yesterday".to_string(),
            notes: None,
        };
        let record = sale.monetary(utc());
        assert_eq!(record.amount, 25.0);
        assert!(record.occurred_at.is_none());
    }

    #[test]
    fn test_partition_debts() {
        let debt = |id: &str, status| Debt {
            id: id.to_string(),
            buyer: "Ana".to_string(),
            amount: Amount::Number(10.0),
            occurred_at: "2024-03-05".to_string(),
            status,
        };
        let debts = vec![
            debt("a", DebtStatus::Pending),
            debt("b", DebtStatus::Paid),
            debt("c", DebtStatus::Pending),
        ];
        let (pending, paid) = partition_debts(&debts);
        assert_eq!(pending.len(), 2);
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].id, "b");
    }
}
