//! Monetary amounts with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal`, rounded to [`AMOUNT_SCALE`] places
//! with banker's rounding before they are summed or compared.

use std::ops::{Add, AddAssign, Sub};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places every posted amount is rounded to.
pub const AMOUNT_SCALE: u32 = 2;

/// Rounds an amount to posting precision (banker's rounding).
#[must_use]
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// A pair of debit and credit totals.
///
/// Used for a single row, an account aggregate, or a whole voucher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitCredit {
    /// Total debit amount.
    pub debit: Decimal,
    /// Total credit amount.
    pub credit: Decimal,
}

impl DebitCredit {
    /// Zero totals.
    pub const ZERO: Self = Self {
        debit: Decimal::ZERO,
        credit: Decimal::ZERO,
    };

    /// Creates totals from both sides.
    #[must_use]
    pub const fn new(debit: Decimal, credit: Decimal) -> Self {
        Self { debit, credit }
    }

    /// A pure debit amount.
    #[must_use]
    pub const fn debit(amount: Decimal) -> Self {
        Self::new(amount, Decimal::ZERO)
    }

    /// A pure credit amount.
    #[must_use]
    pub const fn credit(amount: Decimal) -> Self {
        Self::new(Decimal::ZERO, amount)
    }

    /// One-sided amount from a signed net: positive debits, negative credits.
    #[must_use]
    pub fn from_net(net: Decimal) -> Self {
        if net.is_sign_negative() {
            Self::credit(-net)
        } else {
            Self::debit(net)
        }
    }

    /// Debit minus credit.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Returns true if both sides are equal after rounding.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        round_amount(self.debit) == round_amount(self.credit)
    }

    /// Returns true if both sides are zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.debit.is_zero() && self.credit.is_zero()
    }

    /// Swaps debit and credit.
    #[must_use]
    pub const fn swapped(self) -> Self {
        Self::new(self.credit, self.debit)
    }
}

impl Add for DebitCredit {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.debit + rhs.debit, self.credit + rhs.credit)
    }
}

impl AddAssign for DebitCredit {
    fn add_assign(&mut self, rhs: Self) {
        self.debit += rhs.debit;
        self.credit += rhs.credit;
    }
}

impl Sub for DebitCredit {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.debit - rhs.debit, self.credit - rhs.credit)
    }
}

impl std::iter::Sum for DebitCredit {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}
