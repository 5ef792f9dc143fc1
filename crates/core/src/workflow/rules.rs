//! Approval rules engine.
//!
//! A rule matches an entry when it is active, the entry type equals the
//! rule's transaction type, and every threshold the rule sets holds. Every
//! matching rule produces its own approval request; there is no ranking.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use bursar_shared::types::{ApprovalRuleId, STORAGE_SCALE, fits_scale, fits_storage, max_amount};

use super::error::WorkflowError;
use super::types::ApproverRole;
use crate::ledger::{JournalEntry, JournalEntryType, LedgerError};

/// A configured approval policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Unique identifier for the rule.
    pub id: ApprovalRuleId,
    /// Human-readable name for the rule.
    pub name: String,
    /// Entry type this rule applies to.
    pub transaction_type: JournalEntryType,
    /// Minimum amount (inclusive, None = no minimum).
    pub min_amount: Option<Decimal>,
    /// Maximum amount (inclusive, None = no maximum).
    pub max_amount: Option<Decimal>,
    /// Minimum entry age in days (None = no constraint).
    pub min_age_days: Option<i32>,
    /// Role required to review matching entries.
    pub required_approver_role: ApproverRole,
    /// Inactive rules never match.
    pub is_active: bool,
    /// When the rule was created.
    pub created_at: DateTime<Utc>,
}

impl ApprovalRule {
    /// Returns true if this rule gates `entry` when evaluated on `today`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AmountOverflow`] if the entry amount cannot be
    /// totalled.
    pub fn matches(&self, entry: &JournalEntry, today: NaiveDate) -> Result<bool, LedgerError> {
        Ok(self.applies(entry.entry_type, entry.amount()?, entry.age_days(today)))
    }

    fn applies(&self, entry_type: JournalEntryType, amount: Decimal, age_days: i64) -> bool {
        if !self.is_active || entry_type != self.transaction_type {
            return false;
        }
        let above_min = self.min_amount.is_none_or(|min| amount >= min);
        let below_max = self.max_amount.is_none_or(|max| amount <= max);
        let old_enough = self
            .min_age_days
            .is_none_or(|days| age_days >= i64::from(days));
        above_min && below_max && old_enough
    }

    /// State snapshot recorded in the audit log.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        json!({
            "name": self.name,
            "transaction_type": self.transaction_type,
            "min_amount": self.min_amount,
            "max_amount": self.max_amount,
            "min_age_days": self.min_age_days,
            "required_approver_role": self.required_approver_role,
            "is_active": self.is_active,
        })
    }
}

/// Input for creating an approval rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApprovalRule {
    /// Rule name.
    pub name: String,
    /// Entry type this rule applies to.
    pub transaction_type: JournalEntryType,
    /// Minimum amount.
    pub min_amount: Option<Decimal>,
    /// Maximum amount.
    pub max_amount: Option<Decimal>,
    /// Minimum entry age in days.
    pub min_age_days: Option<i32>,
    /// Role required to review matching entries.
    pub required_approver_role: ApproverRole,
}

impl NewApprovalRule {
    /// Validates the input, collecting every failure.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Rule name is required".to_string());
        }
        for (label, bound) in [("Minimum", self.min_amount), ("Maximum", self.max_amount)] {
            let Some(value) = bound else { continue };
            if value < Decimal::ZERO {
                errors.push(format!("{label} amount cannot be negative"));
            } else if !fits_scale(value, STORAGE_SCALE) {
                errors.push(format!(
                    "{label} amount {value} has more than {STORAGE_SCALE} decimal places"
                ));
            } else if !fits_storage(value) {
                errors.push(format!("{label} amount cannot exceed {}", max_amount()));
            }
        }
        if let (Some(min), Some(max)) = (self.min_amount, self.max_amount)
            && min > max
        {
            errors.push(format!("Minimum amount {min} cannot exceed maximum amount {max}"));
        }
        if self.min_age_days.is_some_and(|d| d < 0) {
            errors.push("Minimum age in days cannot be negative".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(WorkflowError::InvalidRule(errors))
        }
    }

    /// Builds an active rule from validated input.
    pub fn into_rule(self, now: DateTime<Utc>) -> Result<ApprovalRule, WorkflowError> {
        self.validate()?;
        Ok(ApprovalRule {
            id: ApprovalRuleId::new(),
            name: self.name.trim().to_string(),
            transaction_type: self.transaction_type,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            min_age_days: self.min_age_days,
            required_approver_role: self.required_approver_role,
            is_active: true,
            created_at: now,
        })
    }
}

/// Stateless engine for evaluating approval rules.
pub struct RuleEngine;

impl RuleEngine {
    /// Returns every rule that gates `entry`, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AmountOverflow`] if the entry amount cannot be
    /// totalled.
    pub fn match_rules<'a>(
        rules: &'a [ApprovalRule],
        entry: &JournalEntry,
        today: NaiveDate,
    ) -> Result<Vec<&'a ApprovalRule>, LedgerError> {
        let amount = entry.amount()?;
        let age_days = entry.age_days(today);
        Ok(rules
            .iter()
            .filter(|r| r.applies(entry.entry_type, amount, age_days))
            .collect())
    }

    /// Rules installed on a fresh database.
    #[must_use]
    pub fn default_rules() -> Vec<NewApprovalRule> {
        vec![
            NewApprovalRule {
                name: "All Refunds".to_string(),
                transaction_type: JournalEntryType::Refund,
                min_amount: None,
                max_amount: None,
                min_age_days: None,
                required_approver_role: ApproverRole::Bursar,
            },
            NewApprovalRule {
                name: "Large Payment".to_string(),
                transaction_type: JournalEntryType::Expense,
                min_amount: Some(dec!(100000)),
                max_amount: None,
                min_age_days: None,
                required_approver_role: ApproverRole::Principal,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::fixtures::balanced;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn rule(transaction_type: JournalEntryType) -> ApprovalRule {
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

    #[test]
    fn test_type_only_rule_matches_any_amount() {
        let r = rule(JournalEntryType::Refund);
        let refund = balanced(JournalEntryType::Refund, date(1), dec!(0.01));
        let expense = balanced(JournalEntryType::Expense, date(1), dec!(0.01));
        assert!(r.matches(&refund, date(1)).unwrap());
        assert!(!r.matches(&expense, date(1)).unwrap());
    }

    #[test]
    fn test_amount_bounds_inclusive() {
        let r = ApprovalRule {
            min_amount: Some(dec!(100)),
            max_amount: Some(dec!(200)),
            ..rule(JournalEntryType::Expense)
        };
        let at = |amount| {
            r.matches(&balanced(JournalEntryType::Expense, date(1), amount), date(1))
                .unwrap()
        };
        assert!(!at(dec!(99.99)));
        assert!(at(dec!(100)));
        assert!(at(dec!(200)));
        assert!(!at(dec!(200.01)));
    }

    #[test]
    fn test_min_age_days() {
        let r = ApprovalRule {
            min_age_days: Some(7),
            ..rule(JournalEntryType::Adjustment)
        };
        let e = balanced(JournalEntryType::Adjustment, date(1), dec!(10));
        assert!(!r.matches(&e, date(7)).unwrap());
        assert!(r.matches(&e, date(8)).unwrap());

        let future = balanced(JournalEntryType::Adjustment, date(20), dec!(10));
        let zero = ApprovalRule {
            min_age_days: Some(0),
            ..rule(JournalEntryType::Adjustment)
        };
        assert!(!zero.matches(&future, date(1)).unwrap());
    }

    #[test]
    fn test_inactive_rule_never_matches() {
        let r = ApprovalRule {
            is_active: false,
            ..rule(JournalEntryType::Refund)
        };
        let e = balanced(JournalEntryType::Refund, date(1), dec!(10));
        assert!(!r.matches(&e, date(1)).unwrap());
    }

    #[test]
    fn test_every_match_is_returned() {
        let rules = vec![
            rule(JournalEntryType::Expense),
            ApprovalRule {
                min_amount: Some(dec!(100000)),
                ..rule(JournalEntryType::Expense)
            },
            rule(JournalEntryType::Refund),
        ];
        let e = balanced(JournalEntryType::Expense, date(1), dec!(150000));
        assert_eq!(RuleEngine::match_rules(&rules, &e, date(1)).unwrap().len(), 2);
    }

    #[test]
    fn test_default_rules() {
        let defaults = RuleEngine::default_rules();
        assert_eq!(defaults.len(), 2);
        assert!(defaults.iter().all(|r| r.validate().is_ok()));
        assert_eq!(defaults[1].min_amount, Some(dec!(100000)));
    }

    #[test]
    fn test_rule_validation_collects_errors() {
        let input = NewApprovalRule {
            name: String::new(),
            transaction_type: JournalEntryType::Expense,
            min_amount: Some(dec!(500)),
            max_amount: Some(dec!(100)),
            min_age_days: Some(-1),
            required_approver_role: ApproverRole::Bursar,
        };
        match input.validate() {
            Err(WorkflowError::InvalidRule(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected InvalidRule, got {other:?}"),
        }
    }

    #[test]
    fn test_rule_thresholds_must_be_storable() {
        let input = NewApprovalRule {
            name: "Precise".to_string(),
            transaction_type: JournalEntryType::Expense,
            min_amount: Some(dec!(100.005)),
            max_amount: Some(dec!(500000000000000000000)),
            min_age_days: None,
            required_approver_role: ApproverRole::Bursar,
        };
        match input.validate() {
            Err(WorkflowError::InvalidRule(errors)) => assert_eq!(
                errors,
                vec![
                    "Minimum amount 100.005 has more than 2 decimal places".to_string(),
                    "Maximum amount cannot exceed 99999999999999999.99".to_string(),
                ]
            ),
            other => panic!("expected InvalidRule, got {other:?}"),
        }
    }

    #[test]
    fn test_untotallable_entry_is_an_error() {
        let mut e = balanced(JournalEntryType::Refund, date(1), Decimal::MAX);
        e.lines.push(e.lines[0].clone());
        let rules = vec![rule(JournalEntryType::Refund)];
        assert!(matches!(
            RuleEngine::match_rules(&rules, &e, date(1)),
            Err(LedgerError::AmountOverflow)
        ));
    }
}
