//! Reference data consulted by row validation.
//!
//! Fiscal years, cost centers and parties are owned by other modules of the
//! surrounding application; the engine keeps just enough of each to check
//! postings. Parties that were never registered are treated as active and
//! fall back to their company's credit terms.

pub mod fiscal;

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use fiscal::FiscalYear;

use crate::ledger::error::LedgerError;

/// Whether a party buys from or sells to the company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyKind {
    /// Buys from the company; settles receivables.
    Customer,
    /// Sells to the company; settles payables.
    Supplier,
}

/// A customer or supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Party name as used on ledger rows.
    pub name: String,
    /// Customer or supplier.
    pub kind: PartyKind,
    /// Disabled parties cannot be posted against.
    pub disabled: bool,
    /// Days of credit allowed on payment references; falls back to the
    /// company's when unset or zero.
    #[serde(default)]
    pub credit_days: Option<u32>,
    /// Highest outstanding allowed; falls back to the company's when unset
    /// or zero.
    #[serde(default)]
    pub credit_limit: Option<Decimal>,
}

impl Party {
    /// An active customer.
    pub fn customer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PartyKind::Customer,
            disabled: false,
            credit_days: None,
            credit_limit: None,
        }
    }

    /// An active supplier.
    pub fn supplier(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PartyKind::Supplier,
            disabled: false,
            credit_days: None,
            credit_limit: None,
        }
    }
}

/// Company-wide credit defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditTerms {
    /// Days of credit allowed on payment references.
    pub credit_days: u32,
    /// Highest outstanding allowed per customer.
    pub credit_limit: Decimal,
}

/// Registries of fiscal years, cost centers, parties and company credit terms.
#[derive(Debug, Clone, Default)]
pub struct MasterData {
    fiscal_years: HashMap<String, FiscalYear>,
    cost_centers: HashMap<String, String>,
    parties: HashMap<String, Party>,
    credit_terms: HashMap<String, CreditTerms>,
}

impl MasterData {
    /// Creates empty registries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fiscal year.
    ///
    /// # Errors
    ///
    /// Rejects inverted date ranges and years overlapping an existing one.
    pub fn add_fiscal_year(&mut self, year: FiscalYear) -> Result<(), LedgerError> {
        if year.end_date < year.start_date {
            return Err(LedgerError::InvalidMasterData {
                name: year.name,
                reason: "end date is before start date".into(),
            });
        }
        if let Some(existing) = self
            .fiscal_years
            .values()
            .find(|fy| fy.name != year.name && fy.overlaps(&year))
        {
            return Err(LedgerError::InvalidMasterData {
                name: year.name.clone(),
                reason: format!("overlaps fiscal year {}", existing.name),
            });
        }
        self.fiscal_years.insert(year.name.clone(), year);
        Ok(())
    }

    /// Registers a cost center for a company.
    pub fn add_cost_center(&mut self, name: impl Into<String>, company: impl Into<String>) {
        self.cost_centers.insert(name.into(), company.into());
    }

    /// Registers or replaces a party.
    pub fn register_party(&mut self, party: Party) {
        self.parties.insert(party.name.clone(), party);
    }

    /// Looks a party up.
    #[must_use]
    pub fn party(&self, name: &str) -> Option<&Party> {
        self.parties.get(name)
    }

    /// Sets a company's credit defaults.
    pub fn set_credit_terms(&mut self, company: impl Into<String>, terms: CreditTerms) {
        self.credit_terms.insert(company.into(), terms);
    }

    /// Credit days of a party in a company; zero means unlimited.
    #[must_use]
    pub fn credit_days(&self, party: &str, company: &str) -> u32 {
        self.parties
            .get(party)
            .and_then(|p| p.credit_days)
            .filter(|days| *days > 0)
            .or_else(|| self.credit_terms.get(company).map(|t| t.credit_days))
            .unwrap_or(0)
    }

    /// Credit limit of a customer in a company, if one applies.
    ///
    /// Suppliers have no credit limit.
    #[must_use]
    pub fn credit_limit(&self, party: &str, company: &str) -> Option<Decimal> {
        let registered = self.parties.get(party);
        if registered.is_some_and(|p| p.kind == PartyKind::Supplier) {
            return None;
        }
        registered
            .and_then(|p| p.credit_limit)
            .filter(|limit| *limit > Decimal::ZERO)
            .or_else(|| self.credit_terms.get(company).map(|t| t.credit_limit))
            .filter(|limit| *limit > Decimal::ZERO)
    }

    /// The fiscal year containing a date, if any.
    #[must_use]
    pub fn fiscal_year_for(&self, date: NaiveDate) -> Option<&FiscalYear> {
        self.fiscal_years.values().find(|fy| fy.contains_date(date))
    }

    /// Checks that the fiscal year exists and contains the posting date.
    ///
    /// # Errors
    ///
    /// `UnknownFiscalYear` or `PostingDateOutsideFiscalYear`.
    pub fn validate_fiscal_year(&self, name: &str, date: NaiveDate) -> Result<(), LedgerError> {
        let year = self
            .fiscal_years
            .get(name)
            .ok_or_else(|| LedgerError::UnknownFiscalYear(name.to_string()))?;
        if !year.contains_date(date) {
            return Err(LedgerError::PostingDateOutsideFiscalYear {
                date,
                fiscal_year: name.to_string(),
            });
        }
        Ok(())
    }

    /// Checks that the cost center exists and belongs to the company.
    ///
    /// # Errors
    ///
    /// `UnknownCostCenter` or `CostCenterCompanyMismatch`.
    pub fn validate_cost_center(&self, name: &str, company: &str) -> Result<(), LedgerError> {
        match self.cost_centers.get(name) {
            None => Err(LedgerError::UnknownCostCenter(name.to_string())),
            Some(owner) if owner != company => Err(LedgerError::CostCenterCompanyMismatch {
                cost_center: name.to_string(),
                company: company.to_string(),
            }),
            Some(_) => Ok(()),
        }
    }

    /// Checks that the party is not disabled.
    ///
    /// # Errors
    ///
    /// `PartyDisabled`.
    pub fn validate_party(&self, name: &str) -> Result<(), LedgerError> {
        match self.parties.get(name) {
            Some(party) if party.disabled => Err(LedgerError::PartyDisabled(name.to_string())),
            _ => Ok(()),
        }
    }
}
