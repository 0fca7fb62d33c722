use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use super::age::Clock;
use super::catalog::{list_products, validate_product, CatalogError, ProductView};
use super::documents::{DocumentSink, DocumentSinkError};
use super::domain::{
    ApplicationForm, ApplicationId, ApplicationRecord, LoanSnapshot, NewApplication, NewProduct,
    Product, ProductId,
};
use super::eligibility::{
    EligibilityEngine, IntakeContext, ValidationErrors, FIELD_ID_NUMBER, ID_ALREADY_USED,
};
use super::identity::is_well_formed;
use super::repository::{RecordStore, RepositoryError};

/// Service composing the eligibility engine, the record store, and the document sink.
pub struct LoanApplicationService<R, D> {
    store: Arc<R>,
    documents: Arc<D>,
    clock: Arc<dyn Clock>,
    engine: EligibilityEngine,
}

impl<R, D> LoanApplicationService<R, D>
where
    R: RecordStore + 'static,
    D: DocumentSink + 'static,
{
    pub fn new(store: Arc<R>, documents: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            documents,
            clock,
            engine: EligibilityEngine::new(),
        }
    }

    /// Validate and persist an application. Nothing is left behind when any step fails.
    pub fn submit(
        &self,
        form: ApplicationForm,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let today = self.clock.today();

        let product = match form.selected_product_id() {
            Some(id) => self.store.product(id)?,
            None => None,
        };
        let id_number_in_use = match form.id_number.as_deref().map(str::trim) {
            Some(id_number) if is_well_formed(id_number) => {
                self.store.id_number_exists(id_number)?
            }
            _ => false,
        };

        let context = IntakeContext {
            today,
            product: product.as_ref(),
            id_number_in_use,
        };
        let validated = self.engine.validate(form, context).map_err(|errors| {
            let fields = errors.fields().collect::<Vec<_>>().join(",");
            warn!(%fields, "application rejected");
            ApplicationServiceError::Invalid(errors)
        })?;

        let document = self
            .documents
            .store(
                &validated.id_number,
                validated.document_kind,
                &validated.document,
            )
            .map_err(|err| {
                error!(error = %err, "failed to store proof document");
                err
            })?;

        let terms = validated.product.loan_terms();
        let application = NewApplication {
            full_name: validated.full_name,
            id_number: validated.id_number,
            birthday: validated.birthday,
            monthly_income: validated.monthly_income,
            product_id: validated.product.id,
            document: document.clone(),
            submitted_on: today,
            snapshot: LoanSnapshot::from(&terms),
        };

        match self.store.insert_application(application) {
            Ok(record) => {
                info!(
                    application_id = record.id.0,
                    product_id = record.product_id.0,
                    "application accepted"
                );
                Ok(record)
            }
            Err(err) => {
                if let Err(discard) = self.documents.discard(&document) {
                    error!(error = %discard, "failed to discard orphaned proof document");
                }
                match err {
                    RepositoryError::Conflict(_) => {
                        warn!("application rejected by unique ID number index");
                        Err(ApplicationServiceError::Conflict)
                    }
                    other => {
                        error!(error = %other, "failed to persist application");
                        Err(other.into())
                    }
                }
            }
        }
    }

    /// Whether an application already uses `id_number`. Malformed input is reported as absent.
    pub fn id_number_exists(&self, id_number: &str) -> Result<bool, ApplicationServiceError> {
        let id_number = id_number.trim();
        if !is_well_formed(id_number) {
            return Ok(false);
        }
        Ok(self.store.id_number_exists(id_number)?)
    }

    pub fn products(
        &self,
        income: Option<Decimal>,
    ) -> Result<Vec<ProductView>, ApplicationServiceError> {
        Ok(list_products(self.store.as_ref(), income)?)
    }

    pub fn add_product(&self, product: NewProduct) -> Result<Product, ApplicationServiceError> {
        validate_product(&product)?;
        let product = self.store.insert_product(product)?;
        info!(product_id = product.id.0, model = %product.model, "product added to catalog");
        Ok(product)
    }

    pub fn remove_product(&self, id: ProductId) -> Result<(), ApplicationServiceError> {
        self.store.remove_product(id)?;
        Ok(())
    }

    pub fn get(&self, id: ApplicationId) -> Result<ApplicationRecord, ApplicationServiceError> {
        let record = self
            .store
            .application(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Remove an application and its document, freeing the ID number.
    pub fn withdraw(&self, id: ApplicationId) -> Result<(), ApplicationServiceError> {
        let record = self.get(id)?;
        self.store.remove_application(id)?;
        if let Err(err) = self.documents.discard(&record.document) {
            warn!(error = %err, application_id = id.0, "proof document left behind");
        }
        Ok(())
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("application failed validation: {0}")]
    Invalid(ValidationErrors),
    #[error("ID number already used.")]
    Conflict,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Document(#[from] DocumentSinkError),
}

impl ApplicationServiceError {
    /// Field-scoped messages for the response body, when the failure is the applicant's.
    pub fn field_errors(&self) -> Option<ValidationErrors> {
        match self {
            ApplicationServiceError::Invalid(errors) => Some(errors.clone()),
            ApplicationServiceError::Conflict => {
                Some(ValidationErrors::single(FIELD_ID_NUMBER, ID_ALREADY_USED))
            }
            _ => None,
        }
    }
}
