//! Property-based tests for posting, voiding, and balances.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use bursar_shared::types::{AccountId, UserId};

use super::balance::AccountBalance;
use super::entry::fixtures::{credit, debit, entry};
use super::service::LedgerService;
use super::types::{JournalEntryType, NormalBalance};

fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn day() -> impl Strategy<Value = NaiveDate> {
    (1u32..=28).prop_map(|d| NaiveDate::from_ymd_opt(2026, 2, d).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Anything that posts satisfies debits == credits.
    #[test]
    fn prop_posted_entries_are_balanced(
        debit_amount in positive_amount(),
        credit_amount in positive_amount(),
        date in day(),
    ) {
        let e = entry(
            JournalEntryType::Expense,
            date,
            vec![debit(AccountId::new(), debit_amount), credit(AccountId::new(), credit_amount)],
        );
        match LedgerService::post(&e, 0, UserId::new(), Utc::now()) {
            Ok(action) => {
                prop_assert_eq!(debit_amount, credit_amount);
                prop_assert!(action.totals.is_balanced());
            }
            Err(_) => prop_assert_ne!(debit_amount, credit_amount),
        }
    }

    /// Voided entries never count toward a balance, whatever their amounts.
    #[test]
    fn prop_voided_entries_never_count(
        kept in prop::collection::vec(positive_amount(), 0..5),
        voided in prop::collection::vec(positive_amount(), 1..5),
        date in day(),
    ) {
        let cash = AccountId::new();
        let mut entries = Vec::new();
        for amount in &kept {
            let mut e = entry(
                JournalEntryType::FeePayment,
                date,
                vec![debit(cash, *amount), credit(AccountId::new(), *amount)],
            );
            e.is_posted = true;
            entries.push(e);
        }
        for amount in &voided {
            let mut e = entry(
                JournalEntryType::FeePayment,
                date,
                vec![debit(cash, *amount), credit(AccountId::new(), *amount)],
            );
            e.is_posted = true;
            let action = LedgerService::void(&e, "error", UserId::new(), Utc::now()).unwrap();
            action.apply(&mut e);
            entries.push(e);
        }

        let balance =
            AccountBalance::from_entries(cash, NormalBalance::Debit, date, entries.iter());
        prop_assert_eq!(balance.balance, kept.iter().copied().sum::<Decimal>());
    }

    /// Debit-normal and credit-normal balances of the same lines are negations.
    #[test]
    fn prop_normal_sides_are_opposite(
        debit_amount in positive_amount(),
        credit_amount in positive_amount(),
    ) {
        prop_assert_eq!(
            NormalBalance::Debit.balance_change(debit_amount, credit_amount),
            -NormalBalance::Credit.balance_change(debit_amount, credit_amount)
        );
    }
}
