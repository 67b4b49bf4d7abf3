// 📐 Entry Validation - Form rules for new records
// Drafts are what a user typed; they become stored records only after
// passing validation.

use crate::record::{parse_amount_text, parse_occurred_at, DebtStatus};
use chrono::{Offset, Utc};

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: &str) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Join errors into one line for error messages
pub fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// FIELD RULES
// ============================================================================

fn check_amount(amount: &str, errors: &mut Vec<ValidationError>) {
    if amount.trim().is_empty() || parse_amount_text(amount) <= 0.0 {
        errors.push(ValidationError::new("amount", "must be greater than 0"));
    }
}

fn check_occurred_at(occurred_at: &str, errors: &mut Vec<ValidationError>) {
    // Offset only shifts the value, it never decides whether it parses
    if parse_occurred_at(occurred_at, Utc.fix()).is_none() {
        errors.push(ValidationError::new(
            "occurred_at",
            "must be a date (YYYY-MM-DD) or date-time",
        ));
    }
}

fn check_required(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(field, "is required"));
    }
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ============================================================================
// DRAFTS
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SaleDraft {
    pub amount: String,
    pub occurred_at: String,
    pub notes: String,
}

impl SaleDraft {
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        check_amount(&self.amount, &mut errors);
        check_occurred_at(&self.occurred_at, &mut errors);
        finish(errors)
    }

    /// Trimmed notes; blank becomes `None`
    pub fn normalized_notes(&self) -> Option<String> {
        let notes = self.notes.trim();
        if notes.is_empty() {
            None
        } else {
            Some(notes.to_string())
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseDraft {
    pub amount: String,
    pub occurred_at: String,
    pub description: String,
}

impl ExpenseDraft {
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        check_amount(&self.amount, &mut errors);
        check_occurred_at(&self.occurred_at, &mut errors);
        check_required("description", &self.description, &mut errors);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DebtDraft {
    pub buyer: String,
    pub amount: String,
    pub occurred_at: String,
}

impl DebtDraft {
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        check_required("buyer", &self.buyer, &mut errors);
        check_amount(&self.amount, &mut errors);
        check_occurred_at(&self.occurred_at, &mut errors);
        finish(errors)
    }

    /// New debts always start out pending
    pub fn initial_status(&self) -> DebtStatus {
        DebtStatus::Pending
    }
}
