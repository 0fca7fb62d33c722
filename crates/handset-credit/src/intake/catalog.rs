use std::io::Read;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{
    check_column, ColumnOverflow, NewProduct, Product, ProductId, DECIMAL_PLACES,
    DEFAULT_MAX_SALARY_MULTIPLIER, FRACTION_MAX_DIGITS, MONEY_MAX_DIGITS,
};
use super::loan::LoanTerms;
use super::repository::{RecordStore, RepositoryError};

/// Product terms that cannot describe a sellable phone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("{model}: cash price must be positive (found {found})")]
    NonPositivePrice { model: String, found: Decimal },
    #[error("{model}: deposit fraction must be between 0 and 1 (found {found})")]
    DepositOutOfRange { model: String, found: Decimal },
    #[error("{model}: interest rate must not be negative (found {found})")]
    NegativeInterest { model: String, found: Decimal },
    #[error("{model}: salary multiplier must be positive (found {found})")]
    NonPositiveMultiplier { model: String, found: Decimal },
    #[error("make and model are required")]
    MissingName,
    #[error("{model}: {field} {found} does not fit its column: {reason}")]
    ColumnOverflow {
        model: String,
        field: &'static str,
        found: Decimal,
        reason: ColumnOverflow,
    },
}

pub fn validate_product(product: &NewProduct) -> Result<(), CatalogError> {
    if product.make.trim().is_empty() || product.model.trim().is_empty() {
        return Err(CatalogError::MissingName);
    }

    let model = product.model.clone();
    let columns = [
        ("cash_price", product.cash_price, MONEY_MAX_DIGITS),
        ("deposit_percent", product.deposit_percent, FRACTION_MAX_DIGITS),
        ("interest_rate", product.interest_rate, FRACTION_MAX_DIGITS),
        (
            "max_salary_multiplier",
            product.max_salary_multiplier,
            FRACTION_MAX_DIGITS,
        ),
    ];
    for (field, found, max_digits) in columns {
        if let Err(reason) = check_column(found, max_digits, DECIMAL_PLACES) {
            return Err(CatalogError::ColumnOverflow {
                model,
                field,
                found,
                reason,
            });
        }
    }

    if product.cash_price <= Decimal::ZERO {
        return Err(CatalogError::NonPositivePrice {
            model,
            found: product.cash_price,
        });
    }
    if product.deposit_percent < Decimal::ZERO || product.deposit_percent > Decimal::ONE {
        return Err(CatalogError::DepositOutOfRange {
            model,
            found: product.deposit_percent,
        });
    }
    if product.interest_rate < Decimal::ZERO {
        return Err(CatalogError::NegativeInterest {
            model,
            found: product.interest_rate,
        });
    }
    if product.max_salary_multiplier <= Decimal::ZERO {
        return Err(CatalogError::NonPositiveMultiplier {
            model,
            found: product.max_salary_multiplier,
        });
    }

    Ok(())
}

/// Catalog listing entry. Loan figures are only attached when the listing was filtered by
/// income.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub make: String,
    pub model: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cash_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub deposit_percent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub interest_rate: Decimal,
    #[serde(flatten)]
    pub terms: Option<LoanTerms>,
}

impl ProductView {
    fn plain(product: &Product) -> Self {
        Self {
            id: product.id,
            make: product.make.clone(),
            model: product.model.clone(),
            cash_price: product.cash_price,
            deposit_percent: product.deposit_percent,
            interest_rate: product.interest_rate,
            terms: None,
        }
    }

    fn with_terms(product: &Product, terms: LoanTerms) -> Self {
        Self {
            terms: Some(terms),
            ..Self::plain(product)
        }
    }
}

/// Every product, or only those whose monthly installment fits a tenth of `income`.
pub fn list_products<R>(store: &R, income: Option<Decimal>) -> Result<Vec<ProductView>, RepositoryError>
where
    R: RecordStore + ?Sized,
{
    let products = store.products()?;

    let views = match income {
        None => products.iter().map(ProductView::plain).collect(),
        Some(income) => products
            .iter()
            .filter_map(|product| {
                let terms = product.loan_terms();
                terms
                    .affordable_on(income)
                    .then(|| ProductView::with_terms(product, terms))
            })
            .collect(),
    };

    Ok(views)
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogImportError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid product on line {line}: {source}")]
    Product { line: u64, source: CatalogError },
}

/// Parse catalog rows (`make,model,cash_price,deposit_percent,interest_rate` with an optional
/// `max_salary_multiplier` column).
pub fn parse_catalog<R: Read>(reader: R) -> Result<Vec<NewProduct>, CatalogImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut products = Vec::new();

    for record in csv_reader.deserialize::<CatalogRow>() {
        let row = record?;
        let product = row.into_new_product();
        validate_product(&product).map_err(|source| CatalogImportError::Product {
            line: products.len() as u64 + 2,
            source,
        })?;
        products.push(product);
    }

    Ok(products)
}

pub fn parse_catalog_file<P: AsRef<Path>>(path: P) -> Result<Vec<NewProduct>, CatalogImportError> {
    let file = std::fs::File::open(path)?;
    parse_catalog(file)
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    make: String,
    model: String,
    #[serde(deserialize_with = "decimal_from_str")]
    cash_price: Decimal,
    #[serde(deserialize_with = "decimal_from_str")]
    deposit_percent: Decimal,
    #[serde(deserialize_with = "decimal_from_str")]
    interest_rate: Decimal,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    max_salary_multiplier: Option<Decimal>,
}

impl CatalogRow {
    fn into_new_product(self) -> NewProduct {
        NewProduct {
            make: self.make,
            model: self.model,
            cash_price: self.cash_price,
            deposit_percent: self.deposit_percent,
            interest_rate: self.interest_rate,
            max_salary_multiplier: self
                .max_salary_multiplier
                .unwrap_or(DEFAULT_MAX_SALARY_MULTIPLIER),
        }
    }
}

fn decimal_from_str<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.trim().parse::<Decimal>().map_err(serde::de::Error::custom)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(|value| value.parse::<Decimal>().map_err(serde::de::Error::custom))
        .transpose()
}
