use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;

use super::documents::DocumentSink;
use super::domain::{ApplicationForm, ApplicationId, DocumentUpload};
use super::eligibility::{
    FIELD_BIRTHDAY, FIELD_FULL_NAME, FIELD_ID_NUMBER, FIELD_MONTHLY_INCOME, FIELD_PROOF_DOCUMENT,
    FIELD_SELECTED_PHONE, MAX_DOCUMENT_BYTES,
};
use super::repository::{RecordStore, RepositoryError};
use super::service::{ApplicationServiceError, LoanApplicationService};

/// Request body ceiling for the submission endpoint. Sits above the document ceiling so an
/// oversized document is reported as a field error rather than a transport failure.
pub const MAX_SUBMISSION_BYTES: usize = MAX_DOCUMENT_BYTES * 2;

/// Router builder exposing the catalog, ID lookup, and submission endpoints.
pub fn application_router<R, D>(service: Arc<LoanApplicationService<R, D>>) -> Router
where
    R: RecordStore + 'static,
    D: DocumentSink + 'static,
{
    Router::new()
        .route("/api/phones/", get(products_handler::<R, D>))
        .route("/api/check-id/", get(check_id_handler::<R, D>))
        .route(
            "/apply-loan/",
            post(submit_handler::<R, D>)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(MAX_SUBMISSION_BYTES)),
        )
        .route(
            "/api/applications/:application_id",
            get(status_handler::<R, D>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductQuery {
    income: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckIdQuery {
    id_number: Option<String>,
}

pub(crate) async fn products_handler<R, D>(
    State(service): State<Arc<LoanApplicationService<R, D>>>,
    Query(query): Query<ProductQuery>,
) -> Response
where
    R: RecordStore + 'static,
    D: DocumentSink + 'static,
{
    let income = match query
        .income
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
    {
        None => None,
        Some(raw) => match Decimal::from_str(raw) {
            Ok(income) => Some(income),
            Err(_) => {
                let payload = json!({ "error": "income must be a decimal number" });
                return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
            }
        },
    };

    match service.products(income) {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(other) => AppError::from(other).into_response(),
    }
}

pub(crate) async fn check_id_handler<R, D>(
    State(service): State<Arc<LoanApplicationService<R, D>>>,
    Query(query): Query<CheckIdQuery>,
) -> Response
where
    R: RecordStore + 'static,
    D: DocumentSink + 'static,
{
    let id_number = query.id_number.unwrap_or_default();
    match service.id_number_exists(&id_number) {
        Ok(exists) => (StatusCode::OK, Json(json!({ "exists": exists }))).into_response(),
        Err(other) => AppError::from(other).into_response(),
    }
}

pub(crate) async fn submit_handler<R, D>(
    State(service): State<Arc<LoanApplicationService<R, D>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    R: RecordStore + 'static,
    D: DocumentSink + 'static,
{
    let form = match multipart {
        Ok(multipart) => match read_form(multipart).await {
            Ok(form) => form,
            Err(err) => {
                let payload = json!({ "error": err.body_text() });
                return (err.status(), Json(payload)).into_response();
            }
        },
        Err(rejection) => {
            let payload = json!({ "error": rejection.body_text() });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    // Document writes are blocking file I/O.
    match tokio::task::spawn_blocking(move || service.submit(form)).await {
        Ok(Ok(record)) => (StatusCode::ACCEPTED, Json(record.view())).into_response(),
        Ok(Err(err)) => AppError::from(err).into_response(),
        Err(join) => AppError::Server(axum::Error::new(join)).into_response(),
    }
}

pub(crate) async fn status_handler<R, D>(
    State(service): State<Arc<LoanApplicationService<R, D>>>,
    Path(application_id): Path<u64>,
) -> Response
where
    R: RecordStore + 'static,
    D: DocumentSink + 'static,
{
    match service.get(ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(ApplicationServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "application_id": application_id,
                "error": "application not found",
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(other) => AppError::from(other).into_response(),
    }
}

pub(crate) async fn method_not_allowed() -> Response {
    let payload = json!({ "error": "method not allowed" });
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(payload),
    )
        .into_response()
}

async fn read_form(mut multipart: Multipart) -> Result<ApplicationForm, MultipartError> {
    let mut form = ApplicationForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            FIELD_PROOF_DOCUMENT => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                form.proof_document = Some(DocumentUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            FIELD_FULL_NAME => form.full_name = Some(field.text().await?),
            FIELD_ID_NUMBER => form.id_number = Some(field.text().await?),
            FIELD_BIRTHDAY => form.birthday = Some(field.text().await?),
            FIELD_MONTHLY_INCOME => form.monthly_income = Some(field.text().await?),
            FIELD_SELECTED_PHONE => form.selected_phone = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}
