// 📂 CSV Files - Load and save the three record lists
// Amounts and timestamps stay raw text here; parsing happens at aggregation.

use crate::config::AppConfig;
use crate::record::{new_record_id, Amount, Debt, DebtStatus, Expense, Sale};
use crate::store::{MemoryStore, RecordStore};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// ROW SHAPES
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct SaleRow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    amount: String,
    #[serde(default)]
    occurred_at: String,
    #[serde(default)]
    notes: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExpenseRow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    amount: String,
    #[serde(default)]
    occurred_at: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct DebtRow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    buyer: String,
    #[serde(default)]
    amount: String,
    #[serde(default)]
    occurred_at: String,
    #[serde(default)]
    status: String,
}

fn id_or_new(id: String) -> String {
    if id.trim().is_empty() {
        new_record_id()
    } else {
        id
    }
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Sale {
            id: id_or_new(row.id),
            amount: Amount::Text(row.amount),
            occurred_at: row.occurred_at,
            notes: if row.notes.is_empty() { None } else { Some(row.notes) },
        }
    }
}

impl From<&Sale> for SaleRow {
    fn from(sale: &Sale) -> Self {
        SaleRow {
            id: sale.id.clone(),
            amount: sale.amount.to_text(),
            occurred_at: sale.occurred_at.clone(),
            notes: sale.notes.clone().unwrap_or_default(),
        }
    }
}

impl From<ExpenseRow> for Expense {
    fn from(row: ExpenseRow) -> Self {
        Expense {
            id: id_or_new(row.id),
            amount: Amount::Text(row.amount),
            occurred_at: row.occurred_at,
            description: row.description,
        }
    }
}

impl From<&Expense> for ExpenseRow {
    fn from(expense: &Expense) -> Self {
        ExpenseRow {
            id: expense.id.clone(),
            amount: expense.amount.to_text(),
            occurred_at: expense.occurred_at.clone(),
            description: expense.description.clone(),
        }
    }
}

impl From<&Debt> for DebtRow {
    fn from(debt: &Debt) -> Self {
        DebtRow {
            id: debt.id.clone(),
            buyer: debt.buyer.clone(),
            amount: debt.amount.to_text(),
            occurred_at: debt.occurred_at.clone(),
            status: debt.status.as_str().to_string(),
        }
    }
}

// ============================================================================
// GENERIC READ/WRITE
// ============================================================================

/// Missing file means an empty list
fn read_rows<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    if !path.exists() {
        log::info!("{} not found, starting empty", path.display());
        return Ok(Vec::new());
    }

    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let mut rows = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let row: R = result
            .with_context(|| format!("Failed to read row {} of {}", line + 2, path.display()))?;
        rows.push(row);
    }

    Ok(rows)
}

fn write_rows<R: Serialize>(path: &Path, rows: &[R]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    Ok(())
}

// ============================================================================
// PUBLIC API
// ============================================================================

pub fn load_sales(path: &Path) -> Result<Vec<Sale>> {
    Ok(read_rows::<SaleRow>(path)?.into_iter().map(Sale::from).collect())
}

pub fn load_expenses(path: &Path) -> Result<Vec<Expense>> {
    Ok(read_rows::<ExpenseRow>(path)?
        .into_iter()
        .map(Expense::from)
        .collect())
}

/// Rows with an unknown status are skipped with a warning
pub fn load_debts(path: &Path) -> Result<Vec<Debt>> {
    let mut debts = Vec::new();

    for row in read_rows::<DebtRow>(path)? {
        let Some(status) = DebtStatus::parse(&row.status) else {
            log::warn!(
                "Skipping debt {:?} in {}: unknown status {:?}",
                row.id,
                path.display(),
                row.status
            );
            continue;
        };

        debts.push(Debt {
            id: id_or_new(row.id),
            buyer: row.buyer,
            amount: Amount::Text(row.amount),
            occurred_at: row.occurred_at,
            status,
        });
    }

    Ok(debts)
}

pub fn save_sales(path: &Path, sales: &[Sale]) -> Result<()> {
    let rows: Vec<SaleRow> = sales.iter().map(SaleRow::from).collect();
    write_rows(path, &rows)
}

pub fn save_expenses(path: &Path, expenses: &[Expense]) -> Result<()> {
    let rows: Vec<ExpenseRow> = expenses.iter().map(ExpenseRow::from).collect();
    write_rows(path, &rows)
}

pub fn save_debts(path: &Path, debts: &[Debt]) -> Result<()> {
    let rows: Vec<DebtRow> = debts.iter().map(DebtRow::from).collect();
    write_rows(path, &rows)
}

/// Load the configured data directory into a fresh in-memory store
pub fn load_store(config: &AppConfig) -> Result<MemoryStore> {
    let sales = load_sales(&config.sales_path())?;
    let expenses = load_expenses(&config.expenses_path())?;
    let debts = load_debts(&config.debts_path())?;

    log::info!(
        "Loaded {} sales, {} expenses, {} debts from {}",
        sales.len(),
        expenses.len(),
        debts.len(),
        config.data_dir.display()
    );

    Ok(MemoryStore::with_offset(config.offset()?).seeded(sales, expenses, debts))
}

/// Write every list in `store` back to the configured data directory
pub fn save_store(config: &AppConfig, store: &dyn RecordStore) -> Result<()> {
    save_sales(&config.sales_path(), &store.list_sales()?)?;
    save_expenses(&config.expenses_path(), &store.list_expenses()?)?;
    save_debts(&config.debts_path(), &store.list_debts()?)?;
    Ok(())
}
