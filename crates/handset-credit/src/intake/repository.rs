use super::domain::{
    ApplicationId, ApplicationRecord, NewApplication, NewProduct, Product, ProductId,
};

/// Storage abstraction for the catalog and the applications that reference it.
///
/// Implementations own the integrity rules: product models and application ID numbers are
/// unique (enforced atomically at insert, not by a prior lookup), and a product referenced by
/// any application cannot be removed.
pub trait RecordStore: Send + Sync {
    fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError>;
    fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
    fn products(&self) -> Result<Vec<Product>, RepositoryError>;
    fn remove_product(&self, id: ProductId) -> Result<(), RepositoryError>;

    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn application(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn id_number_exists(&self, id_number: &str) -> Result<bool, RepositoryError>;
    fn remove_application(&self, id: ApplicationId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("a record with this {0} already exists")]
    Conflict(&'static str),
    #[error("record not found")]
    NotFound,
    #[error("record is referenced by {references} application(s) and cannot be removed")]
    Protected { references: usize },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
