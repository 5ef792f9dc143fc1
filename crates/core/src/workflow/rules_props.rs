//! Property-based tests for approval rule matching.

use chrono::{Duration, NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::ledger::JournalEntryType;
use crate::ledger::entry::fixtures::balanced;
use crate::workflow::rules::{ApprovalRule, NewApprovalRule};
use crate::workflow::types::ApproverRole;

fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_type() -> impl Strategy<Value = JournalEntryType> {
    prop::sample::select(JournalEntryType::ALL.to_vec())
}

fn base_rule(transaction_type: JournalEntryType) -> ApprovalRule {
    NewApprovalRule {
        name: "rule".to_string(),
        transaction_type,
        min_amount: None,
        max_amount: None,
        min_age_days: None,
        required_approver_role: ApproverRole::Bursar,
    }
    .into_rule(Utc::now())
    .unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A rule with no thresholds matches exactly the entries of its type.
    #[test]
    fn prop_unconstrained_rule_matches_type(
        rule_type in arb_type(),
        entry_type in arb_type(),
        value in amount(),
    ) {
        let rule = base_rule(rule_type);
        let entry = balanced(entry_type, today(), value);
        prop_assert_eq!(rule.matches(&entry, today()).unwrap(), rule_type == entry_type);
    }

    /// Amount bounds are inclusive on both ends.
    #[test]
    fn prop_amount_bounds(min in amount(), span in amount(), value in amount()) {
        let max = min + span;
        let rule = ApprovalRule {
            min_amount: Some(min),
            max_amount: Some(max),
            ..base_rule(JournalEntryType::Expense)
        };
        let entry = balanced(JournalEntryType::Expense, today(), value);
        prop_assert_eq!(rule.matches(&entry, today()).unwrap(), value >= min && value <= max);
        let at_min = balanced(JournalEntryType::Expense, today(), min);
        let at_max = balanced(JournalEntryType::Expense, today(), max);
        prop_assert!(rule.matches(&at_min, today()).unwrap());
        prop_assert!(rule.matches(&at_max, today()).unwrap());
    }

    /// Age threshold holds exactly when the entry is at least that many days old.
    #[test]
    fn prop_min_age(min_age in 0i32..400, age in -30i64..400) {
        let rule = ApprovalRule {
            min_age_days: Some(min_age),
            ..base_rule(JournalEntryType::Adjustment)
        };
        let entry_date = today() - Duration::days(age);
        let entry = balanced(JournalEntryType::Adjustment, entry_date, Decimal::ONE);
        prop_assert_eq!(rule.matches(&entry, today()).unwrap(), age >= i64::from(min_age));
    }

    /// Valid rule input always has min <= max.
    #[test]
    fn prop_rule_validation_bounds(a in amount(), b in amount()) {
        let input = NewApprovalRule {
            name: "bounds".to_string(),
            transaction_type: JournalEntryType::Salary,
            min_amount: Some(a),
            max_amount: Some(b),
            min_age_days: None,
            required_approver_role: ApproverRole::Principal,
        };
        prop_assert_eq!(input.validate().is_ok(), a <= b);
    }
}
