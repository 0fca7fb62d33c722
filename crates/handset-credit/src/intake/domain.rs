use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::loan::LoanTerms;

/// Identifier wrapper for catalog products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

/// Identifier wrapper for persisted applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub u64);

/// Default number of monthly salaries a buyer may spend on a phone.
pub const DEFAULT_MAX_SALARY_MULTIPLIER: Decimal = dec!(10);

/// Total digits of a money column (price, income).
pub const MONEY_MAX_DIGITS: u32 = 10;
/// Total digits of a fraction column (deposit, interest, salary multiplier).
pub const FRACTION_MAX_DIGITS: u32 = 4;
pub const DECIMAL_PLACES: u32 = 2;

/// Way a value fails to fit a fixed-point column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOverflow {
    DecimalPlaces { max: u32 },
    WholeDigits { max: u32 },
}

impl std::fmt::Display for ColumnOverflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnOverflow::DecimalPlaces { max } => {
                write!(f, "Ensure that there are no more than {max} decimal places.")
            }
            ColumnOverflow::WholeDigits { max } => write!(
                f,
                "Ensure that there are no more than {max} digits before the decimal point."
            ),
        }
    }
}

/// Check `value` against a column of `max_digits` digits, `decimal_places` of them after the
/// point. Trailing fractional zeros do not count.
pub fn check_column(
    value: Decimal,
    max_digits: u32,
    decimal_places: u32,
) -> Result<(), ColumnOverflow> {
    if value.normalize().scale() > decimal_places {
        return Err(ColumnOverflow::DecimalPlaces {
            max: decimal_places,
        });
    }

    let whole_digits = max_digits.saturating_sub(decimal_places);
    if value.abs().trunc() >= Decimal::from(10u64.pow(whole_digits)) {
        return Err(ColumnOverflow::WholeDigits { max: whole_digits });
    }

    Ok(())
}

/// Phone offered on credit. Terms are fixed once the product is in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub make: String,
    pub model: String,
    pub cash_price: Decimal,
    pub deposit_percent: Decimal,
    pub interest_rate: Decimal,
    /// Carried for the catalog but not consulted by the affordability rule, which applies a
    /// flat multiplier instead.
    pub max_salary_multiplier: Decimal,
}

impl Product {
    pub fn loan_terms(&self) -> LoanTerms {
        LoanTerms::for_product(self)
    }
}

/// Catalog entry before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub make: String,
    pub model: String,
    pub cash_price: Decimal,
    pub deposit_percent: Decimal,
    pub interest_rate: Decimal,
    #[serde(default = "default_multiplier")]
    pub max_salary_multiplier: Decimal,
}

fn default_multiplier() -> Decimal {
    DEFAULT_MAX_SALARY_MULTIPLIER
}

impl NewProduct {
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            make: self.make,
            model: self.model,
            cash_price: self.cash_price,
            deposit_percent: self.deposit_percent,
            interest_rate: self.interest_rate,
            max_salary_multiplier: self.max_salary_multiplier,
        }
    }
}

/// Raw multipart submission as received from the applicant. Every field is optional so the
/// eligibility engine can report each missing value alongside the other failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationForm {
    pub full_name: Option<String>,
    pub id_number: Option<String>,
    pub birthday: Option<String>,
    pub monthly_income: Option<String>,
    pub selected_phone: Option<String>,
    pub proof_document: Option<DocumentUpload>,
}

impl ApplicationForm {
    /// Parsed product reference; `None` when absent or not an integer.
    pub fn selected_product_id(&self) -> Option<ProductId> {
        self.selected_phone
            .as_deref()
            .map(str::trim)
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(ProductId)
    }
}

/// Uploaded proof-of-income file. `content_type` is whatever the client declared.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl std::fmt::Debug for DocumentUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Accepted proof-of-income formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Jpeg,
    Png,
}

impl DocumentKind {
    pub const fn extension(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Jpeg => "jpg",
            DocumentKind::Png => "png",
        }
    }
}

/// Sink-side handle for a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub storage_key: String,
    pub kind: DocumentKind,
    pub size: u64,
}

/// Submission that passed every eligibility rule, ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedApplication {
    pub full_name: String,
    pub id_number: String,
    pub birthday: NaiveDate,
    pub monthly_income: Decimal,
    pub product: Product,
    pub document: DocumentUpload,
    pub document_kind: DocumentKind,
}

/// Row handed to the record store. Loan figures are copied from the product at this point
/// and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplication {
    pub full_name: String,
    pub id_number: String,
    pub birthday: NaiveDate,
    pub monthly_income: Decimal,
    pub product_id: ProductId,
    pub document: DocumentRef,
    pub submitted_on: NaiveDate,
    pub snapshot: LoanSnapshot,
}

impl NewApplication {
    pub fn into_record(self, id: ApplicationId) -> ApplicationRecord {
        ApplicationRecord {
            id,
            full_name: self.full_name,
            id_number: self.id_number,
            birthday: self.birthday,
            monthly_income: self.monthly_income,
            product_id: self.product_id,
            document: self.document,
            submitted_on: self.submitted_on,
            snapshot: self.snapshot,
        }
    }
}

/// Persisted application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub full_name: String,
    pub id_number: String,
    pub birthday: NaiveDate,
    pub monthly_income: Decimal,
    pub product_id: ProductId,
    pub document: DocumentRef,
    pub submitted_on: NaiveDate,
    pub snapshot: LoanSnapshot,
}

impl ApplicationRecord {
    pub fn view(&self) -> ApplicationView {
        ApplicationView {
            application_id: self.id,
            full_name: self.full_name.clone(),
            product_id: self.product_id,
            submitted_on: self.submitted_on,
            loan_principal: self.snapshot.loan_principal,
            loan_amount: self.snapshot.loan_amount,
            daily_payment: self.snapshot.daily_payment,
        }
    }
}

/// Loan figures frozen onto an application, in currency cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSnapshot {
    pub loan_principal: Decimal,
    pub loan_amount: Decimal,
    pub daily_payment: Decimal,
}

impl From<&LoanTerms> for LoanSnapshot {
    fn from(terms: &LoanTerms) -> Self {
        Self {
            loan_principal: to_cents(terms.principal),
            loan_amount: to_cents(terms.total_amount),
            daily_payment: to_cents(terms.daily_installment),
        }
    }
}

fn to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointNearestEven)
}

/// Outward representation of a stored application. Omits the ID number and document key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationView {
    pub application_id: ApplicationId,
    pub full_name: String,
    pub product_id: ProductId,
    pub submitted_on: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub loan_principal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub loan_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub daily_payment: Decimal,
}
