//! Business rule validation for journal entries.
//!
//! Two layers: [`validate_new_entry`] checks recorded input and reports every
//! problem at once, [`validate_for_posting`] enforces the double-entry rules on
//! the stored lines and stops at the first violation.

use rust_decimal::Decimal;

use bursar_shared::types::{fits_scale, fits_storage, max_amount};

use super::entry::JournalLine;
use super::error::LedgerError;
use super::types::{EntryTotals, NewJournalEntry};

/// Returns true if exactly one side of the pair is strictly positive and the
/// other is zero.
#[must_use]
pub fn is_single_sided(debit: Decimal, credit: Decimal) -> bool {
    match (debit > Decimal::ZERO, credit > Decimal::ZERO) {
        (true, false) => credit == Decimal::ZERO,
        (false, true) => debit == Decimal::ZERO,
        _ => false,
    }
}

/// Validates recorded input for a new entry, collecting every failure.
///
/// Amounts may carry at most `scale` decimal places and must fit the stored
/// amount columns. Balance is not checked here: unbalanced entries may be
/// recorded and are refused at posting time.
pub fn validate_new_entry(input: &NewJournalEntry, scale: u32) -> Result<(), LedgerError> {
    let mut errors = Vec::new();

    if input.reference.trim().is_empty() {
        errors.push("Reference is required".to_string());
    }
    if input.description.trim().is_empty() {
        errors.push("Description is required".to_string());
    }
    if input.lines.is_empty() {
        errors.push("Entry must have at least one line".to_string());
    }
    for (idx, line) in input.lines.iter().enumerate() {
        let n = idx + 1;
        if !is_single_sided(line.debit_amount, line.credit_amount) {
            errors.push(format!(
                "Line {n} must have exactly one positive debit or credit amount"
            ));
        }
        for amount in [line.debit_amount, line.credit_amount] {
            if !fits_scale(amount, scale) {
                errors.push(format!(
                    "Line {n} amount {amount} has more than {scale} decimal places"
                ));
            } else if !fits_storage(amount) {
                errors.push(format!("Line {n} amount cannot exceed {}", max_amount()));
            }
        }
    }
    if errors.is_empty()
        && EntryTotals::from_pairs(input.lines.iter().map(|l| (l.debit_amount, l.credit_amount)))
            .is_err()
    {
        errors.push("Entry amounts are too large to total".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::Validation(errors))
    }
}

/// Validates the lines of an entry for posting.
///
/// Requires at least one line, every line single-sided, at least one debit and
/// one credit line, and total debits equal to total credits.
///
/// # Errors
///
/// Returns the first violated rule; an imbalance carries both totals and the
/// difference.
pub fn validate_for_posting(lines: &[JournalLine]) -> Result<EntryTotals, LedgerError> {
    if lines.is_empty() {
        return Err(LedgerError::NoLines);
    }

    let mut has_debit = false;
    let mut has_credit = false;

    for (idx, line) in lines.iter().enumerate() {
        if !is_single_sided(line.debit_amount, line.credit_amount) {
            return Err(LedgerError::InvalidLine { line: idx + 1 });
        }
        has_debit |= line.is_debit();
        has_credit |= line.is_credit();
    }

    if !has_debit || !has_credit {
        return Err(LedgerError::SingleSided);
    }

    let totals = EntryTotals::from_pairs(lines.iter().map(|l| (l.debit_amount, l.credit_amount)))?;
    if !totals.is_balanced() {
        return Err(LedgerError::Unbalanced {
            debit: totals.debit,
            credit: totals.credit,
            difference: totals.difference(),
        });
    }

    Ok(totals)
}
