use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use crate::intake::age::FixedClock;
use crate::intake::documents::{DocumentSink, DocumentSinkError};
use crate::intake::domain::{
    ApplicationForm, ApplicationId, ApplicationRecord, DocumentKind, DocumentRef, DocumentUpload,
    NewApplication, NewProduct, Product, ProductId,
};
use crate::intake::eligibility::IntakeContext;
use crate::intake::identity::luhn_checksum;
use crate::intake::repository::{RecordStore, RepositoryError};
use crate::intake::service::LoanApplicationService;
use crate::intake::store::InMemoryRecordStore;

pub(super) const REFERENCE_ID: &str = "8001015009087";

pub(super) fn today() -> NaiveDate {
    date(2026, 10, 19)
}

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// ID number whose embedded birth date is `birth` and whose check digit is valid.
pub(super) fn id_number_born(birth: NaiveDate) -> String {
    let prefix = format!("{}500908", birth.format("%y%m%d"));
    (0..10)
        .map(|check| format!("{prefix}{check}"))
        .find(|candidate| {
            let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
            luhn_checksum(&digits)
        })
        .expect("one check digit always balances the sum")
}

pub(super) fn new_product(model: &str, cash_price: Decimal) -> NewProduct {
    NewProduct {
        make: "Samsung".to_string(),
        model: model.to_string(),
        cash_price,
        deposit_percent: dec!(0.1),
        interest_rate: dec!(0.15),
        max_salary_multiplier: dec!(10),
    }
}

pub(super) fn product() -> Product {
    new_product("Galaxy A15", dec!(1000)).into_product(ProductId(1))
}

pub(super) fn pdf() -> DocumentUpload {
    DocumentUpload {
        file_name: Some("payslip.pdf".to_string()),
        content_type: Some("application/pdf".to_string()),
        bytes: b"%PDF-1.7 payslip".to_vec(),
    }
}

pub(super) fn form_for(product_id: ProductId) -> ApplicationForm {
    ApplicationForm {
        full_name: Some("Thandi Mokoena".to_string()),
        id_number: Some(REFERENCE_ID.to_string()),
        birthday: Some("1980-01-01".to_string()),
        monthly_income: Some("12000".to_string()),
        selected_phone: Some(product_id.0.to_string()),
        proof_document: Some(pdf()),
    }
}

/// Valid form for an applicant born on `birth`, ID number and birthday in agreement.
pub(super) fn form_born(product_id: ProductId, birth: NaiveDate) -> ApplicationForm {
    ApplicationForm {
        id_number: Some(id_number_born(birth)),
        birthday: Some(birth.format("%Y-%m-%d").to_string()),
        ..form_for(product_id)
    }
}

pub(super) fn context(product: &Product) -> IntakeContext<'_> {
    IntakeContext {
        today: today(),
        product: Some(product),
        id_number_in_use: false,
    }
}

pub(super) type TestService = LoanApplicationService<InMemoryRecordStore, MemoryDocumentSink>;

pub(super) fn build_service() -> (
    TestService,
    Arc<InMemoryRecordStore>,
    Arc<MemoryDocumentSink>,
    Product,
) {
    let store = Arc::new(InMemoryRecordStore::new());
    let documents = Arc::new(MemoryDocumentSink::default());
    let product = store
        .insert_product(new_product("Galaxy A15", dec!(1000)))
        .expect("seed product");
    let service = LoanApplicationService::new(
        store.clone(),
        documents.clone(),
        Arc::new(FixedClock(today())),
    );
    (service, store, documents, product)
}

#[derive(Default)]
pub(super) struct MemoryDocumentSink {
    stored: Mutex<HashMap<String, DocumentRef>>,
    discarded: Mutex<Vec<String>>,
    pub(super) fail_writes: bool,
}

impl MemoryDocumentSink {
    pub(super) fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub(super) fn stored_keys(&self) -> Vec<String> {
        self.stored
            .lock()
            .expect("sink mutex poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub(super) fn discarded(&self) -> Vec<String> {
        self.discarded.lock().expect("sink mutex poisoned").clone()
    }
}

impl DocumentSink for MemoryDocumentSink {
    fn store(
        &self,
        id_number: &str,
        kind: DocumentKind,
        upload: &DocumentUpload,
    ) -> Result<DocumentRef, DocumentSinkError> {
        let storage_key = crate::intake::documents::storage_key(id_number, kind);
        if self.fail_writes {
            return Err(DocumentSinkError::Write {
                path: storage_key.into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }

        let document = DocumentRef {
            storage_key: storage_key.clone(),
            kind,
            size: upload.size() as u64,
        };
        self.stored
            .lock()
            .expect("sink mutex poisoned")
            .insert(storage_key, document.clone());
        Ok(document)
    }

    fn discard(&self, document: &DocumentRef) -> Result<(), DocumentSinkError> {
        self.stored
            .lock()
            .expect("sink mutex poisoned")
            .remove(&document.storage_key);
        self.discarded
            .lock()
            .expect("sink mutex poisoned")
            .push(document.storage_key.clone());
        Ok(())
    }
}

/// Store whose existence lookup never sees concurrent inserts, so the unique index at insert
/// time is the only thing standing between two submissions of the same ID number.
#[derive(Default)]
pub(super) struct RacingStore {
    pub(super) inner: InMemoryRecordStore,
}

impl RecordStore for RacingStore {
    fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        self.inner.insert_product(product)
    }

    fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.inner.product(id)
    }

    fn products(&self) -> Result<Vec<Product>, RepositoryError> {
        self.inner.products()
    }

    fn remove_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        self.inner.remove_product(id)
    }

    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<ApplicationRecord, RepositoryError> {
        self.inner.insert_application(application)
    }

    fn application(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.inner.application(id)
    }

    fn id_number_exists(&self, _id_number: &str) -> Result<bool, RepositoryError> {
        Ok(false)
    }

    fn remove_application(&self, id: ApplicationId) -> Result<(), RepositoryError> {
        self.inner.remove_application(id)
    }
}

pub(super) struct UnavailableStore;

impl RecordStore for UnavailableStore {
    fn insert_product(&self, _product: NewProduct) -> Result<Product, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn product(&self, _id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn products(&self) -> Result<Vec<Product>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove_product(&self, _id: ProductId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_application(
        &self,
        _application: NewApplication,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn application(&self, _id: ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn id_number_exists(&self, _id_number: &str) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove_application(&self, _id: ApplicationId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

const BOUNDARY: &str = "handset-credit-boundary";

pub(super) fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Encode `form` the way a browser would post it.
pub(super) fn multipart_body(form: &ApplicationForm) -> Vec<u8> {
    let mut body = Vec::new();
    let text_fields = [
        ("full_name", &form.full_name),
        ("id_number", &form.id_number),
        ("birthday", &form.birthday),
        ("monthly_income", &form.monthly_income),
        ("selected_phone", &form.selected_phone),
    ];

    for (name, value) in text_fields {
        if let Some(value) = value {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
    }

    if let Some(document) = &form.proof_document {
        let file_name = document.file_name.as_deref().unwrap_or("upload.bin");
        let mut header = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"proof_document\"; filename=\"{file_name}\"\r\n"
        );
        if let Some(content_type) = &document.content_type {
            header.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        header.push_str("\r\n");
        body.extend_from_slice(header.as_bytes());
        body.extend_from_slice(&document.bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
