use chrono::NaiveDate;
use handset_credit::error::AppError;
use handset_credit::intake::{
    parse_catalog_file, DocumentSink, LoanApplicationService, RecordStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Add every product in the CSV at `path` to the catalog, returning how many were added.
pub(crate) fn seed_catalog<R, D>(
    service: &LoanApplicationService<R, D>,
    path: &Path,
) -> Result<usize, AppError>
where
    R: RecordStore + 'static,
    D: DocumentSink + 'static,
{
    let products = parse_catalog_file(path)?;
    let count = products.len();
    for product in products {
        service.add_product(product)?;
    }
    Ok(count)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|err| format!("failed to parse '{raw}' as a decimal ({err})"))
}
