//! One-year, single-period phone loan.
//!
//! Two installment figures come out of the same total: a daily one over a 360-day banker's
//! year (stored on applications) and a monthly one over twelve months (used only to filter
//! the catalog by income). They are different units and are never derived from each other.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::domain::Product;

/// Days in the banker's year used for the daily installment.
pub const BANKERS_YEAR_DAYS: Decimal = dec!(360);

/// Months in the fixed loan term.
pub const TERM_MONTHS: Decimal = dec!(12);

/// Derived loan figures for a cash price, deposit fraction, and interest fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoanTerms {
    #[serde(rename = "loan_principal", with = "rust_decimal::serde::float")]
    pub principal: Decimal,
    #[serde(rename = "loan_amount", with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(rename = "daily_payment", with = "rust_decimal::serde::float")]
    pub daily_installment: Decimal,
    #[serde(rename = "monthly_payment", with = "rust_decimal::serde::float")]
    pub monthly_installment: Decimal,
}

impl LoanTerms {
    pub fn compute(cash_price: Decimal, deposit_percent: Decimal, interest_rate: Decimal) -> Self {
        let principal = cash_price * (Decimal::ONE - deposit_percent);
        let total_amount = principal * (Decimal::ONE + interest_rate);

        Self {
            principal,
            total_amount,
            daily_installment: total_amount / BANKERS_YEAR_DAYS,
            monthly_installment: total_amount / TERM_MONTHS,
        }
    }

    pub fn for_product(product: &Product) -> Self {
        Self::compute(
            product.cash_price,
            product.deposit_percent,
            product.interest_rate,
        )
    }

    /// Whether the monthly installment fits within a tenth of the monthly income.
    pub fn affordable_on(&self, monthly_income: Decimal) -> bool {
        self.monthly_installment <= monthly_income / dec!(10)
    }
}
