use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::age::age_on;
use super::domain::{
    check_column, ApplicationForm, DocumentKind, DocumentUpload, Product, ValidatedApplication,
    DECIMAL_PLACES, MONEY_MAX_DIGITS,
};
use super::identity::validate_id_number;

pub const FIELD_FULL_NAME: &str = "full_name";
pub const FIELD_ID_NUMBER: &str = "id_number";
pub const FIELD_BIRTHDAY: &str = "birthday";
pub const FIELD_MONTHLY_INCOME: &str = "monthly_income";
pub const FIELD_SELECTED_PHONE: &str = "selected_phone";
pub const FIELD_PROOF_DOCUMENT: &str = "proof_document";

pub const MINIMUM_AGE: i32 = 18;
pub const MAXIMUM_AGE: i32 = 65;

/// Months of salary a cash price may not exceed. Applied to every product regardless of the
/// product's own `max_salary_multiplier`.
pub const AFFORDABILITY_MULTIPLIER: Decimal = dec!(10);

pub const MAX_DOCUMENT_MB: usize = 5;
pub const MAX_DOCUMENT_BYTES: usize = MAX_DOCUMENT_MB * 1024 * 1024;

pub const MAX_FULL_NAME_CHARS: usize = 150;

pub const ID_ALREADY_USED: &str = "ID number already used.";

const REQUIRED: &str = "This field is required.";

/// Field-scoped validation failures, in field order, each field keeping its messages in the
/// order the rules raised them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Inputs the engine needs from outside the form: the evaluation date, the product the
/// form's `selected_phone` resolved to, and whether the ID number is already on file.
#[derive(Debug, Clone, Copy)]
pub struct IntakeContext<'a> {
    pub today: NaiveDate,
    pub product: Option<&'a Product>,
    pub id_number_in_use: bool,
}

/// Stateless validator turning a raw form into a persistable application.
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityEngine;

impl EligibilityEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run every rule and return either the validated submission or all failures at once.
    pub fn validate(
        &self,
        form: ApplicationForm,
        context: IntakeContext<'_>,
    ) -> Result<ValidatedApplication, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let full_name = clean_full_name(form.full_name.as_deref(), &mut errors);
        let (id_number, id_birth_date) =
            clean_id_number(form.id_number.as_deref(), context, &mut errors);
        let birthday = clean_birthday(form.birthday.as_deref(), &mut errors);
        let monthly_income = clean_monthly_income(form.monthly_income.as_deref(), &mut errors);
        let product = clean_selected_phone(form.selected_phone.as_deref(), context, &mut errors);
        let document = clean_proof_document(form.proof_document, &mut errors);

        if let (Some(from_id), Some(submitted)) = (id_birth_date, birthday) {
            if from_id != submitted {
                errors.add(FIELD_BIRTHDAY, "Birthday does not match ID number.");
            }
        }

        if let Some(submitted) = birthday {
            let age = age_on(submitted, context.today);
            if age < MINIMUM_AGE {
                errors.add(
                    FIELD_BIRTHDAY,
                    format!("Applicant must be at least {MINIMUM_AGE} years old."),
                );
            } else if age > MAXIMUM_AGE {
                errors.add(
                    FIELD_BIRTHDAY,
                    format!("Applicant must be under {} years old.", MAXIMUM_AGE + 1),
                );
            }
        }

        if let (Some(income), Some(product)) = (monthly_income, product) {
            let ceiling = income.checked_mul(AFFORDABILITY_MULTIPLIER);
            if ceiling.map_or(false, |ceiling| product.cash_price > ceiling) {
                errors.add(
                    FIELD_SELECTED_PHONE,
                    "Selected phone may be too expensive for your income.",
                );
            }
        }

        match (
            full_name,
            id_number,
            birthday,
            monthly_income,
            product,
            document,
        ) {
            (
                Some(full_name),
                Some(id_number),
                Some(birthday),
                Some(monthly_income),
                Some(product),
                Some((document, document_kind)),
            ) if errors.is_empty() => Ok(ValidatedApplication {
                full_name,
                id_number,
                birthday,
                monthly_income,
                product: product.clone(),
                document,
                document_kind,
            }),
            _ => Err(errors),
        }
    }
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn clean_full_name(raw: Option<&str>, errors: &mut ValidationErrors) -> Option<String> {
    let Some(name) = present(raw) else {
        errors.add(FIELD_FULL_NAME, REQUIRED);
        return None;
    };

    let length = name.chars().count();
    if length > MAX_FULL_NAME_CHARS {
        errors.add(
            FIELD_FULL_NAME,
            format!(
                "Ensure this value has at most {MAX_FULL_NAME_CHARS} characters (it has {length})."
            ),
        );
        return None;
    }

    Some(name.to_string())
}

fn clean_id_number(
    raw: Option<&str>,
    context: IntakeContext<'_>,
    errors: &mut ValidationErrors,
) -> (Option<String>, Option<NaiveDate>) {
    let Some(id_number) = present(raw) else {
        errors.add(FIELD_ID_NUMBER, "ID number is required.");
        return (None, None);
    };

    let check = validate_id_number(id_number, context.today.year());
    if !check.valid {
        errors.add(FIELD_ID_NUMBER, "Invalid SA ID number.");
        return (None, None);
    }

    if context.id_number_in_use {
        errors.add(FIELD_ID_NUMBER, ID_ALREADY_USED);
        return (None, check.date_of_birth);
    }

    (Some(id_number.to_string()), check.date_of_birth)
}

fn clean_birthday(raw: Option<&str>, errors: &mut ValidationErrors) -> Option<NaiveDate> {
    let Some(value) = present(raw) else {
        errors.add(FIELD_BIRTHDAY, REQUIRED);
        return None;
    };

    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(FIELD_BIRTHDAY, "Enter a valid date.");
            None
        }
    }
}

fn clean_monthly_income(raw: Option<&str>, errors: &mut ValidationErrors) -> Option<Decimal> {
    let Some(value) = present(raw) else {
        errors.add(FIELD_MONTHLY_INCOME, REQUIRED);
        return None;
    };

    let Ok(income) = value.parse::<Decimal>() else {
        errors.add(FIELD_MONTHLY_INCOME, "Enter a number.");
        return None;
    };

    if income < Decimal::ZERO {
        errors.add(
            FIELD_MONTHLY_INCOME,
            "Ensure this value is greater than or equal to 0.",
        );
        return None;
    }

    if let Err(overflow) = check_column(income, MONEY_MAX_DIGITS, DECIMAL_PLACES) {
        errors.add(FIELD_MONTHLY_INCOME, overflow.to_string());
        return None;
    }

    Some(income)
}

fn clean_selected_phone<'a>(
    raw: Option<&str>,
    context: IntakeContext<'a>,
    errors: &mut ValidationErrors,
) -> Option<&'a Product> {
    if present(raw).is_none() {
        errors.add(FIELD_SELECTED_PHONE, REQUIRED);
        return None;
    }

    if context.product.is_none() {
        errors.add(
            FIELD_SELECTED_PHONE,
            "Select a valid choice. That choice is not one of the available choices.",
        );
    }
    context.product
}

fn clean_proof_document(
    upload: Option<DocumentUpload>,
    errors: &mut ValidationErrors,
) -> Option<(DocumentUpload, DocumentKind)> {
    let Some(upload) = upload.filter(|upload| upload.size() > 0) else {
        errors.add(FIELD_PROOF_DOCUMENT, "Proof of income document is required.");
        return None;
    };

    if upload.size() > MAX_DOCUMENT_BYTES {
        errors.add(
            FIELD_PROOF_DOCUMENT,
            format!("File size must be under {MAX_DOCUMENT_MB}MB."),
        );
        return None;
    }

    match upload.content_type.as_deref().and_then(document_kind) {
        Some(kind) => Some((upload, kind)),
        None => {
            errors.add(
                FIELD_PROOF_DOCUMENT,
                "Invalid file type. Allowed: PDF, JPG, PNG.",
            );
            None
        }
    }
}

/// Maps the client-declared content type onto an accepted document kind. The bytes are not
/// inspected, so a mislabelled upload passes as whatever it claims to be.
pub fn document_kind(content_type: &str) -> Option<DocumentKind> {
    let parsed: mime::Mime = content_type.trim().parse().ok()?;

    let top = parsed.type_().as_str().to_ascii_lowercase();
    let sub = parsed.subtype().as_str().to_ascii_lowercase();

    match (top.as_str(), sub.as_str()) {
        ("application", "pdf") => Some(DocumentKind::Pdf),
        ("image", "jpeg") | ("image", "jpg") => Some(DocumentKind::Jpeg),
        ("image", "png") => Some(DocumentKind::Png),
        _ => None,
    }
}
