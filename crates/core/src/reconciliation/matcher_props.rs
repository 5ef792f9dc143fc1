//! Property-based tests for matching tolerances and statement close-out.

use chrono::{Duration, NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use bursar_shared::types::{JournalEntryId, UserId};

use crate::reconciliation::closure::ClosureService;
use crate::reconciliation::error::ReconciliationError;
use crate::reconciliation::matcher::fixtures::{account, line, statement, tx};
use crate::reconciliation::matcher::{MatchService, check_amount};
use crate::reconciliation::types::{BankStatement, MatchTolerance, StatementLine, StatementStatus};

fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

fn matched(mut l: StatementLine) -> StatementLine {
    l.is_matched = true;
    l.matched_transaction_id = Some(JournalEntryId::new());
    l
}

fn with_balances(opening: Decimal, closing: Decimal) -> BankStatement {
    BankStatement {
        opening_balance: opening,
        closing_balance: closing,
        ..statement(&account(), StatementStatus::Partial)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A difference equal to the tolerance passes; one minor unit more fails.
    #[test]
    fn prop_amount_tolerance_boundary(ledger in amount(), tol_cents in 0i64..10_000) {
        let tolerance = Decimal::new(tol_cents, 2);
        prop_assert!(check_amount(ledger + tolerance, ledger, tolerance).is_ok());
        prop_assert!(check_amount(ledger - tolerance, ledger, tolerance).is_ok());
        let over = tolerance + Decimal::new(1, 2);
        prop_assert!(check_amount(ledger + over, ledger, tolerance).is_err());
    }

    /// Exactly N days apart matches; N + 1 does not, in either direction.
    #[test]
    fn prop_date_tolerance_boundary(days in 0i64..10, before in any::<bool>()) {
        let acct = account();
        let stmt = statement(&acct, StatementStatus::Pending);
        let t = tx(base_date(), Decimal::new(1000, 2));
        let tolerance = MatchTolerance {
            amount: Decimal::ZERO,
            days,
        };
        let offset = |n: i64| {
            if before {
                base_date() - Duration::days(n)
            } else {
                base_date() + Duration::days(n)
            }
        };
        let run = |l: &StatementLine| {
            let by = UserId::new();
            MatchService::match_line(&stmt, &acct, l, &t, None, tolerance, by, Utc::now())
        };

        let at = line(&stmt, offset(days), Decimal::ZERO, t.amount);
        prop_assert!(run(&at).is_ok());

        let past = line(&stmt, offset(days + 1), Decimal::ZERO, t.amount);
        let result = run(&past);
        let is_date_error = matches!(result, Err(ReconciliationError::DateOutOfTolerance { .. }));
        prop_assert!(is_date_error);
    }

    /// The reported variance is exactly declared minus calculated.
    #[test]
    fn prop_closure_variance(
        opening in amount(),
        credits in prop::collection::vec(amount(), 1..8),
        drift in 2i64..1_000_000,
        negative in any::<bool>(),
    ) {
        let template = with_balances(opening, Decimal::ZERO);
        let lines: Vec<_> = credits
            .iter()
            .map(|c| matched(line(&template, base_date(), Decimal::ZERO, *c)))
            .collect();
        let calculated = opening + credits.iter().copied().sum::<Decimal>();
        let magnitude = Decimal::new(drift, 2);
        let signed = if negative { -magnitude } else { magnitude };

        let cent = Decimal::new(1, 2);
        let exact = with_balances(opening, calculated);
        prop_assert!(
            ClosureService::reconcile(&exact, &lines, cent, UserId::new(), Utc::now()).is_ok()
        );

        let off = with_balances(opening, calculated + signed);
        match ClosureService::reconcile(&off, &lines, cent, UserId::new(), Utc::now()) {
            Err(ReconciliationError::ClosingBalanceMismatch { variance, calculated: c, .. }) => {
                prop_assert_eq!(variance, signed);
                prop_assert_eq!(c, calculated);
            }
            other => prop_assert!(false, "expected mismatch, got {:?}", other),
        }
    }

    /// Clearing a match twice leaves the same state and emits no second action.
    #[test]
    fn prop_unmatch_twice_is_noop(value in amount()) {
        let acct = account();
        let stmt = statement(&acct, StatementStatus::Partial);
        let mut l = matched(line(&stmt, base_date(), Decimal::ZERO, value));

        let first = MatchService::unmatch_line(&stmt, &l, UserId::new(), Utc::now()).unwrap();
        prop_assert!(first.is_some());
        if let Some(action) = first {
            action.apply(&mut l);
        }
        let snapshot = l.clone();
        let second = MatchService::unmatch_line(&stmt, &l, UserId::new(), Utc::now()).unwrap();
        prop_assert!(second.is_none());
        prop_assert_eq!(l, snapshot);
    }
}
