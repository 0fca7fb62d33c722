//! Phone credit application intake: ID and age checks, affordability, loan terms, and the
//! HTTP surface that accepts applications with a proof-of-income document.

pub mod age;
pub mod catalog;
pub mod documents;
pub mod domain;
pub mod eligibility;
pub mod identity;
pub mod loan;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use age::{age_on, Clock, FixedClock, SystemClock};
pub use catalog::{
    list_products, parse_catalog, parse_catalog_file, CatalogError, CatalogImportError,
    ProductView,
};
pub use documents::{DocumentSink, DocumentSinkError, FileSystemDocumentSink};
pub use domain::{
    ApplicationForm, ApplicationId, ApplicationRecord, ApplicationView, DocumentKind,
    DocumentRef, DocumentUpload, LoanSnapshot, NewApplication, NewProduct, Product, ProductId,
};
pub use eligibility::{EligibilityEngine, IntakeContext, ValidationErrors};
pub use identity::{validate_id_number, IdentityCheck};
pub use loan::LoanTerms;
pub use repository::{RecordStore, RepositoryError};
pub use router::application_router;
pub use service::{ApplicationServiceError, LoanApplicationService};
pub use store::InMemoryRecordStore;
