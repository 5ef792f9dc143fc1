//! Import validation for bank statements and statement lines.
//!
//! Every field is checked and all failures are returned together; nothing is
//! imported when any check fails.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use bursar_shared::types::{fits_scale, fits_storage, max_amount};

use super::types::{NewBankStatement, StatementLineInput};
use crate::ledger::is_single_sided;

/// Date format accepted on import.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A statement line that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLine {
    /// Line date.
    pub line_date: NaiveDate,
    /// Trimmed description.
    pub description: String,
    /// Trimmed reference, if any.
    pub reference: Option<String>,
    /// Debit amount (zero when credit).
    pub debit_amount: Decimal,
    /// Credit amount (zero when debit).
    pub credit_amount: Decimal,
    /// Running balance, if supplied.
    pub running_balance: Option<Decimal>,
}

/// A statement header that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedStatement {
    /// Statement date.
    pub statement_date: NaiveDate,
    /// Period start.
    pub period_start: Option<NaiveDate>,
    /// Period end.
    pub period_end: Option<NaiveDate>,
    /// Opening balance.
    pub opening_balance: Decimal,
    /// Declared closing balance.
    pub closing_balance: Decimal,
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(field: &str, raw: &str, errors: &mut Vec<String>) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
        Some(date)
    } else {
        errors.push(format!("{field} must be a valid date (YYYY-MM-DD)"));
        None
    }
}

fn parse_amount(field: &str, raw: &str, scale: u32, errors: &mut Vec<String>) -> Option<Decimal> {
    match Decimal::from_str(raw.trim()) {
        Ok(value) if !fits_scale(value, scale) => {
            errors.push(format!("{field} has more than {scale} decimal places"));
            None
        }
        Ok(value) if !fits_storage(value) => {
            errors.push(format!("{field} cannot exceed {}", max_amount()));
            None
        }
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(format!("{field} must be a number"));
            None
        }
    }
}

/// Validates a statement line for import into a statement dated
/// `statement_date`, evaluated on `today`.
///
/// # Errors
///
/// Returns every failure: description empty, malformed, future, or
/// post-statement date, amounts non-numeric or not exactly one strictly
/// positive side, running balance non-numeric.
pub fn validate_statement_line(
    input: &StatementLineInput,
    statement_date: NaiveDate,
    today: NaiveDate,
    scale: u32,
) -> Result<ValidatedLine, Vec<String>> {
    let mut errors = Vec::new();

    let description = input.description.trim();
    if description.is_empty() {
        errors.push("Description is required".to_string());
    }

    let line_date = parse_date("Date", &input.line_date, &mut errors);
    if let Some(date) = line_date {
        if date > today {
            errors.push("Date cannot be in the future".to_string());
        }
        if date > statement_date {
            errors.push(format!(
                "Date cannot be after the statement date ({statement_date})"
            ));
        }
    }

    let debit = blank_to_none(input.debit_amount.as_deref())
        .map(|raw| parse_amount("Debit amount", raw, scale, &mut errors));
    let credit = blank_to_none(input.credit_amount.as_deref())
        .map(|raw| parse_amount("Credit amount", raw, scale, &mut errors));

    let mut amounts = None;
    // Only judge the sides once both parsed (or were omitted).
    if !matches!(debit, Some(None)) && !matches!(credit, Some(None)) {
        let d = debit.flatten().unwrap_or(Decimal::ZERO);
        let c = credit.flatten().unwrap_or(Decimal::ZERO);
        if d < Decimal::ZERO || c < Decimal::ZERO {
            errors.push("Amounts cannot be negative".to_string());
        } else if is_single_sided(d, c) {
            amounts = Some((d, c));
        } else {
            errors.push("Exactly one of debit or credit must be greater than zero".to_string());
        }
    }

    let running_balance = match blank_to_none(input.running_balance.as_deref()) {
        Some(raw) => parse_amount("Running balance", raw, scale, &mut errors),
        None => None,
    };

    match (line_date, amounts) {
        (Some(line_date), Some((debit_amount, credit_amount))) if errors.is_empty() => {
            Ok(ValidatedLine {
                line_date,
                description: description.to_string(),
                reference: blank_to_none(input.reference.as_deref()).map(str::to_string),
                debit_amount,
                credit_amount,
                running_balance,
            })
        }
        _ => Err(errors),
    }
}

/// Validates a statement header evaluated on `today`.
///
/// # Errors
///
/// Returns every failure: malformed or future statement date, malformed
/// period bounds or start after end, non-numeric balances.
pub fn validate_new_statement(
    input: &NewBankStatement,
    today: NaiveDate,
    scale: u32,
) -> Result<ValidatedStatement, Vec<String>> {
    let mut errors = Vec::new();

    let statement_date = parse_date("Statement date", &input.statement_date, &mut errors);
    if statement_date.is_some_and(|d| d > today) {
        errors.push("Statement date cannot be in the future".to_string());
    }

    let period_start = blank_to_none(input.period_start.as_deref())
        .and_then(|raw| parse_date("Period start", raw, &mut errors));
    let period_end = blank_to_none(input.period_end.as_deref())
        .and_then(|raw| parse_date("Period end", raw, &mut errors));
    if let (Some(start), Some(end)) = (period_start, period_end)
        && start > end
    {
        errors.push("Period start cannot be after period end".to_string());
    }

    let opening = parse_amount("Opening balance", &input.opening_balance, scale, &mut errors);
    let closing = parse_amount("Closing balance", &input.closing_balance, scale, &mut errors);

    match (statement_date, opening, closing) {
        (Some(statement_date), Some(opening_balance), Some(closing_balance))
            if errors.is_empty() =>
        {
            Ok(ValidatedStatement {
                statement_date,
                period_start,
                period_end,
                opening_balance,
                closing_balance,
            })
        }
        _ => Err(errors),
    }
}
