//! Frozen-period, frozen-account and balance-sign checks.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::{PeriodConfig, types::RoleSet};

use crate::accounts::{Account, BalanceMustBe};
use crate::ledger::error::LedgerError;

/// Authorization checks driven by the accounts settings.
///
/// `adv_adj` marks a re-post made by reconciliation; such re-posts only move
/// amounts between references and bypass every check here.
#[derive(Debug, Clone, Copy)]
pub struct PeriodGuard<'a> {
    config: &'a PeriodConfig,
}

impl<'a> PeriodGuard<'a> {
    /// Creates a guard over the given settings.
    #[must_use]
    pub const fn new(config: &'a PeriodConfig) -> Self {
        Self { config }
    }

    /// Returns true if the caller holds the configured modifier role.
    #[must_use]
    pub fn is_modifier(&self, roles: &RoleSet) -> bool {
        self.config
            .frozen_accounts_modifier
            .as_deref()
            .is_some_and(|role| roles.contains(role))
    }

    /// Returns true if the caller holds the configured credit controller
    /// role.
    #[must_use]
    pub fn is_credit_controller(&self, roles: &RoleSet) -> bool {
        self.config
            .credit_controller
            .as_deref()
            .is_some_and(|role| roles.contains(role))
    }

    /// Rejects postings dated on or before `acc_frozen_upto` unless the
    /// caller holds the modifier role.
    ///
    /// # Errors
    ///
    /// `FrozenPeriod`.
    pub fn check_freezing_date(
        &self,
        posting_date: NaiveDate,
        roles: &RoleSet,
        adv_adj: bool,
    ) -> Result<(), LedgerError> {
        if adv_adj {
            return Ok(());
        }
        match self.config.acc_frozen_upto {
            Some(frozen_upto) if posting_date <= frozen_upto && !self.is_modifier(roles) => {
                Err(LedgerError::FrozenPeriod {
                    date: posting_date,
                    frozen_upto,
                })
            }
            _ => Ok(()),
        }
    }

    /// Rejects postings to a frozen account unless the caller holds the
    /// modifier role. With no modifier role configured, frozen accounts take
    /// no postings at all.
    ///
    /// # Errors
    ///
    /// `FrozenAccount`.
    pub fn validate_frozen_account(
        &self,
        account: &Account,
        roles: &RoleSet,
        adv_adj: bool,
    ) -> Result<(), LedgerError> {
        if !account.frozen || adv_adj || self.is_modifier(roles) {
            return Ok(());
        }
        Err(LedgerError::FrozenAccount {
            account: account.name.clone(),
        })
    }

    /// Rejects a posting that would leave the account's raw balance
    /// (debit - credit) on the wrong side of zero.
    ///
    /// # Errors
    ///
    /// `BalanceTypeViolation`.
    pub fn validate_balance_type(
        &self,
        account: &Account,
        current: Decimal,
        delta: Decimal,
        adv_adj: bool,
    ) -> Result<(), LedgerError> {
        let Some(must_be) = account.balance_must_be else {
            return Ok(());
        };
        if adv_adj {
            return Ok(());
        }
        let balance = current + delta;
        let violated = match must_be {
            BalanceMustBe::Debit => balance < Decimal::ZERO,
            BalanceMustBe::Credit => balance > Decimal::ZERO,
        };
        if violated {
            return Err(LedgerError::BalanceTypeViolation {
                account: account.name.clone(),
                must_be,
                balance,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{NormalBalance, ReportType};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use tally_shared::types::AccountId;

    fn config() -> PeriodConfig {
        PeriodConfig {
            acc_frozen_upto: NaiveDate::from_ymd_opt(2024, 3, 31),
            frozen_accounts_modifier: Some("Accounts Manager".into()),
            ..PeriodConfig::default()
        }
    }

    fn account() -> Account {
        Account {
            id: AccountId::new(),
            name: "Cash".into(),
            parent: Some(AccountId::new()),
            company: "Acme".into(),
            is_group: false,
            report_type: ReportType::BalanceSheet,
            account_type: None,
            normal_balance: NormalBalance::Debit,
            frozen: false,
            disabled: false,
            balance_must_be: None,
            lft: 2,
            rgt: 3,
        }
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    // ========================================================================
    // Freezing date
    // ========================================================================

    #[test]
    fn test_frozen_date_requires_role() {
        let cfg = config();
        let guard = PeriodGuard::new(&cfg);
        let clerk = RoleSet::from_iter(["Accounts User"]);
        let manager = RoleSet::from_iter(["Accounts User", "Accounts Manager"]);

        assert!(matches!(
            guard.check_freezing_date(date(3, 31), &clerk, false),
            Err(LedgerError::FrozenPeriod { .. })
        ));
        guard.check_freezing_date(date(3, 31), &manager, false).unwrap();
        guard.check_freezing_date(date(4, 1), &clerk, false).unwrap();
    }

    #[test]
    fn test_adv_adj_bypasses_freezing_date() {
        let cfg = config();
        let guard = PeriodGuard::new(&cfg);
        guard
            .check_freezing_date(date(1, 1), &RoleSet::empty(), true)
            .unwrap();
    }

    #[test]
    fn test_no_freeze_date_allows_everything() {
        let cfg = PeriodConfig::default();
        PeriodGuard::new(&cfg)
            .check_freezing_date(date(1, 1), &RoleSet::empty(), false)
            .unwrap();
    }

    // ========================================================================
    // Frozen accounts
    // ========================================================================

    #[test]
    fn test_frozen_account_rules() {
        let cfg = config();
        let guard = PeriodGuard::new(&cfg);
        let mut acc = account();
        acc.frozen = true;

        assert!(guard
            .validate_frozen_account(&acc, &RoleSet::empty(), false)
            .is_err());
        guard
            .validate_frozen_account(&acc, &RoleSet::from_iter(["Accounts Manager"]), false)
            .unwrap();
        guard
            .validate_frozen_account(&acc, &RoleSet::empty(), true)
            .unwrap();
    }

    #[test]
    fn test_frozen_account_without_modifier_role_rejects_everyone() {
        let cfg = PeriodConfig::default();
        let guard = PeriodGuard::new(&cfg);
        let mut acc = account();
        acc.frozen = true;
        let err = guard
            .validate_frozen_account(&acc, &RoleSet::from_iter(["Accounts Manager"]), false)
            .unwrap_err();
        assert_eq!(err, LedgerError::FrozenAccount { account: "Cash".into() });
    }

    #[test]
    fn test_credit_controller_role() {
        let cfg = PeriodConfig {
            credit_controller: Some("Credit Controller".into()),
            ..config()
        };
        let guard = PeriodGuard::new(&cfg);
        assert!(guard.is_credit_controller(&RoleSet::from_iter(["Credit Controller"])));
        assert!(!guard.is_credit_controller(&RoleSet::from_iter(["Accounts Manager"])));
        assert!(!PeriodGuard::new(&config()).is_credit_controller(&RoleSet::from_iter(["Credit Controller"])));
    }

    // ========================================================================
    // Balance sign
    // ========================================================================

    #[test]
    fn test_balance_must_be_debit() {
        let cfg = config();
        let guard = PeriodGuard::new(&cfg);
        let mut acc = account();
        acc.balance_must_be = Some(BalanceMustBe::Debit);

        guard.validate_balance_type(&acc, dec!(100), dec!(-100), false).unwrap();
        assert!(matches!(
            guard.validate_balance_type(&acc, dec!(100), dec!(-100.01), false),
            Err(LedgerError::BalanceTypeViolation { .. })
        ));
        guard.validate_balance_type(&acc, dec!(100), dec!(-500), true).unwrap();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A credit-only account accepts exactly the postings that keep it <= 0.
        #[test]
        fn prop_balance_must_be_credit(current in -100_000i64..100_000, delta in -100_000i64..100_000) {
            let cfg = PeriodConfig::default();
            let guard = PeriodGuard::new(&cfg);
            let mut acc = account();
            acc.balance_must_be = Some(BalanceMustBe::Credit);

            let (current, delta) = (Decimal::new(current, 2), Decimal::new(delta, 2));
            let result = guard.validate_balance_type(&acc, current, delta, false);
            prop_assert_eq!(result.is_ok(), current + delta <= Decimal::ZERO);
        }
    }
}
