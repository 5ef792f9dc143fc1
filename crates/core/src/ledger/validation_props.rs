//! Property-based tests for journal entry posting validation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use bursar_shared::types::AccountId;

use super::entry::fixtures::{credit, debit};
use super::entry::JournalLine;
use super::error::LedgerError;
use super::validation::{is_single_sided, validate_for_posting};

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a list of positive amounts.
fn amounts(max: usize) -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(positive_amount(), 1..max)
}

/// Splits `total` across debit lines and a single credit line.
fn balanced_lines(debits: &[Decimal]) -> Vec<JournalLine> {
    let total: Decimal = debits.iter().copied().sum();
    let mut lines: Vec<JournalLine> = debits
        .iter()
        .map(|d| debit(AccountId::new(), *d))
        .collect();
    lines.push(credit(AccountId::new(), total));
    lines
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any entry whose debits equal credits posts, and the totals match.
    #[test]
    fn prop_balanced_entry_accepted(debits in amounts(8)) {
        let lines = balanced_lines(&debits);
        let totals = validate_for_posting(&lines);
        prop_assert!(totals.is_ok(), "balanced entry rejected: {:?}", totals);
        let totals = totals.unwrap();
        prop_assert_eq!(totals.debit, totals.credit);
        prop_assert_eq!(totals.debit, debits.iter().copied().sum::<Decimal>());
    }

    /// Perturbing one side by any non-zero amount is rejected with the exact difference.
    #[test]
    fn prop_unbalanced_entry_rejected(
        debits in amounts(8),
        delta in positive_amount(),
    ) {
        let mut lines = balanced_lines(&debits);
        if let Some(last) = lines.last_mut() {
            last.credit_amount += delta;
        }
        match validate_for_posting(&lines) {
            Err(LedgerError::Unbalanced { debit, credit, difference }) => {
                prop_assert_eq!(credit - debit, delta);
                prop_assert_eq!(difference, -delta);
            }
            other => prop_assert!(false, "expected Unbalanced, got {:?}", other),
        }
    }

    /// A line carrying both a debit and a credit is rejected even when totals balance.
    #[test]
    fn prop_two_sided_line_rejected(amount in positive_amount(), extra in positive_amount()) {
        let mut first = debit(AccountId::new(), amount);
        first.credit_amount = extra;
        let lines = vec![first, credit(AccountId::new(), amount), debit(AccountId::new(), extra)];
        prop_assert!(
            matches!(validate_for_posting(&lines), Err(LedgerError::InvalidLine { line: 1 })),
            "two-sided line should be rejected"
        );
    }

    /// Lines on one side only are rejected.
    #[test]
    fn prop_single_sided_entry_rejected(debits in amounts(6)) {
        let lines: Vec<JournalLine> = debits.iter().map(|d| debit(AccountId::new(), *d)).collect();
        prop_assert!(matches!(validate_for_posting(&lines), Err(LedgerError::SingleSided)));
    }

    /// Single-sidedness holds exactly when one amount is positive and the other zero.
    #[test]
    fn prop_single_sided_definition(a in -1000i64..1000, b in -1000i64..1000) {
        let (d, c) = (Decimal::new(a, 2), Decimal::new(b, 2));
        let expected = (d > Decimal::ZERO && c == Decimal::ZERO)
            || (c > Decimal::ZERO && d == Decimal::ZERO);
        prop_assert_eq!(is_single_sided(d, c), expected);
    }
}
