use super::common::*;
use crate::intake::domain::{DocumentKind, DocumentUpload, ProductId};
use crate::intake::eligibility::{
    EligibilityEngine, IntakeContext, FIELD_BIRTHDAY, FIELD_FULL_NAME, FIELD_ID_NUMBER,
    FIELD_MONTHLY_INCOME, FIELD_PROOF_DOCUMENT, FIELD_SELECTED_PHONE, ID_ALREADY_USED,
    MAX_DOCUMENT_BYTES,
};
use rust_decimal_macros::dec;

#[test]
fn accepts_complete_submission() {
    let product = product();
    let validated = EligibilityEngine::new()
        .validate(form_for(product.id), context(&product))
        .expect("submission is eligible");

    assert_eq!(validated.id_number, REFERENCE_ID);
    assert_eq!(validated.birthday, date(1980, 1, 1));
    assert_eq!(validated.monthly_income, dec!(12000));
    assert_eq!(validated.product, product);
    assert_eq!(validated.document_kind, DocumentKind::Pdf);
}

#[test]
fn trims_text_fields() {
    let product = product();
    let mut form = form_for(product.id);
    form.full_name = Some("  Thandi Mokoena ".to_string());
    form.id_number = Some(format!(" {REFERENCE_ID} "));

    let validated = EligibilityEngine::new()
        .validate(form, context(&product))
        .expect("whitespace is ignored");

    assert_eq!(validated.full_name, "Thandi Mokoena");
    assert_eq!(validated.id_number, REFERENCE_ID);
}

#[test]
fn missing_document_fails_even_when_everything_else_is_valid() {
    let product = product();
    let mut form = form_for(product.id);
    form.proof_document = None;

    let errors = EligibilityEngine::new()
        .validate(form, context(&product))
        .expect_err("document is mandatory");

    assert_eq!(errors.fields().collect::<Vec<_>>(), vec![FIELD_PROOF_DOCUMENT]);
    assert_eq!(
        errors.messages(FIELD_PROOF_DOCUMENT),
        ["Proof of income document is required."]
    );
}

#[test]
fn empty_upload_counts_as_missing() {
    let product = product();
    let mut form = form_for(product.id);
    form.proof_document = Some(DocumentUpload {
        file_name: Some("empty.pdf".to_string()),
        content_type: Some("application/pdf".to_string()),
        bytes: Vec::new(),
    });

    let errors = EligibilityEngine::new()
        .validate(form, context(&product))
        .expect_err("empty upload");
    assert!(errors.has(FIELD_PROOF_DOCUMENT));
}

#[test]
fn collects_every_failure_in_one_pass() {
    let product = product();
    let mut form = form_for(product.id);
    form.full_name = None;
    form.id_number = Some("8001015009088".to_string());
    form.monthly_income = Some("lots".to_string());
    form.proof_document = None;

    let errors = EligibilityEngine::new()
        .validate(form, context(&product))
        .expect_err("several failures");

    assert_eq!(errors.messages(FIELD_FULL_NAME), ["This field is required."]);
    assert_eq!(errors.messages(FIELD_ID_NUMBER), ["Invalid SA ID number."]);
    assert_eq!(errors.messages(FIELD_MONTHLY_INCOME), ["Enter a number."]);
    assert!(errors.has(FIELD_PROOF_DOCUMENT));
    assert!(!errors.has(FIELD_BIRTHDAY));
}

#[test]
fn birthday_must_match_id_number() {
    let product = product();
    let mut form = form_for(product.id);
    form.birthday = Some("1980-01-02".to_string());

    let errors = EligibilityEngine::new()
        .validate(form, context(&product))
        .expect_err("mismatch");

    assert_eq!(
        errors.messages(FIELD_BIRTHDAY),
        ["Birthday does not match ID number."]
    );
}

#[test]
fn malformed_birthday_is_a_format_error() {
    let product = product();
    let mut form = form_for(product.id);
    form.birthday = Some("01/01/1980".to_string());

    let errors = EligibilityEngine::new()
        .validate(form, context(&product))
        .expect_err("bad date");

    assert_eq!(errors.messages(FIELD_BIRTHDAY), ["Enter a valid date."]);
}

#[test]
fn age_bounds_are_inclusive() {
    let product = product();
    let engine = EligibilityEngine::new();

    let eighteen_today = date(2008, 10, 19);
    let sixty_five_today = date(1961, 10, 19);
    for birth in [eighteen_today, sixty_five_today] {
        engine
            .validate(form_born(product.id, birth), context(&product))
            .unwrap_or_else(|errors| panic!("born {birth} should pass: {errors}"));
    }
}

#[test]
fn seventeen_year_olds_are_too_young() {
    let product = product();
    let errors = EligibilityEngine::new()
        .validate(form_born(product.id, date(2008, 10, 20)), context(&product))
        .expect_err("age 17");

    assert_eq!(
        errors.messages(FIELD_BIRTHDAY),
        ["Applicant must be at least 18 years old."]
    );
}

#[test]
fn sixty_six_year_olds_are_too_old() {
    let product = product();
    let errors = EligibilityEngine::new()
        .validate(form_born(product.id, date(1960, 10, 19)), context(&product))
        .expect_err("age 66");

    assert_eq!(
        errors.messages(FIELD_BIRTHDAY),
        ["Applicant must be under 66 years old."]
    );
}

#[test]
fn cash_price_above_ten_months_income_is_unaffordable() {
    let product = product();
    let engine = EligibilityEngine::new();

    let mut at_limit = form_for(product.id);
    at_limit.monthly_income = Some("100".to_string());
    engine
        .validate(at_limit, context(&product))
        .expect("price equal to ten months income passes");

    let mut below_limit = form_for(product.id);
    below_limit.monthly_income = Some("99.99".to_string());
    let errors = engine
        .validate(below_limit, context(&product))
        .expect_err("too expensive");
    assert_eq!(
        errors.messages(FIELD_SELECTED_PHONE),
        ["Selected phone may be too expensive for your income."]
    );
}

#[test]
fn product_salary_multiplier_does_not_change_affordability() {
    let mut product = product();
    product.max_salary_multiplier = dec!(2);
    let mut form = form_for(product.id);
    form.monthly_income = Some("100".to_string());

    EligibilityEngine::new()
        .validate(form, context(&product))
        .expect("flat multiplier of ten applies");
}

#[test]
fn zero_income_is_checked_against_the_price() {
    let product = product();
    let mut form = form_for(product.id);
    form.monthly_income = Some("0".to_string());

    let errors = EligibilityEngine::new()
        .validate(form, context(&product))
        .expect_err("nothing is affordable on zero income");
    assert!(errors.has(FIELD_SELECTED_PHONE));
    assert!(!errors.has(FIELD_MONTHLY_INCOME));
}

#[test]
fn negative_income_is_rejected() {
    let product = product();
    let mut form = form_for(product.id);
    form.monthly_income = Some("-1".to_string());

    let errors = EligibilityEngine::new()
        .validate(form, context(&product))
        .expect_err("negative income");
    assert_eq!(
        errors.messages(FIELD_MONTHLY_INCOME),
        ["Ensure this value is greater than or equal to 0."]
    );
}

#[test]
fn income_beyond_eight_whole_digits_is_a_field_error() {
    let product = product();
    let mut form = form_for(product.id);
    form.monthly_income = Some(rust_decimal::Decimal::MAX.to_string());

    let errors = EligibilityEngine::new()
        .validate(form, context(&product))
        .expect_err("income does not fit the column");
    assert_eq!(
        errors.messages(FIELD_MONTHLY_INCOME),
        ["Ensure that there are no more than 8 digits before the decimal point."]
    );
    assert!(!errors.has(FIELD_SELECTED_PHONE));
}

#[test]
fn income_with_fractions_of_a_cent_is_rejected() {
    let product = product();
    let mut form = form_for(product.id);
    form.monthly_income = Some("12000.005".to_string());

    let errors = EligibilityEngine::new()
        .validate(form, context(&product))
        .expect_err("three decimal places");
    assert_eq!(
        errors.messages(FIELD_MONTHLY_INCOME),
        ["Ensure that there are no more than 2 decimal places."]
    );
}

#[test]
fn largest_storable_income_is_accepted() {
    let product = product();
    let mut form = form_for(product.id);
    form.monthly_income = Some("99999999.99".to_string());

    let validated = EligibilityEngine::new()
        .validate(form, context(&product))
        .expect("fits the column");
    assert_eq!(validated.monthly_income, dec!(99999999.99));
}

#[test]
fn document_size_ceiling_is_five_megabytes() {
    let product = product();
    let engine = EligibilityEngine::new();

    let mut at_ceiling = form_for(product.id);
    at_ceiling.proof_document = Some(DocumentUpload {
        bytes: vec![0u8; MAX_DOCUMENT_BYTES],
        ..pdf()
    });
    engine
        .validate(at_ceiling, context(&product))
        .expect("exactly five megabytes is allowed");

    let mut oversized = form_for(product.id);
    oversized.proof_document = Some(DocumentUpload {
        bytes: vec![0u8; MAX_DOCUMENT_BYTES + 1],
        ..pdf()
    });
    let errors = engine
        .validate(oversized, context(&product))
        .expect_err("too large");
    assert_eq!(
        errors.messages(FIELD_PROOF_DOCUMENT),
        ["File size must be under 5MB."]
    );
}

#[test]
fn document_kind_comes_from_declared_content_type() {
    let product = product();
    let engine = EligibilityEngine::new();

    let mut gif = form_for(product.id);
    gif.proof_document = Some(DocumentUpload {
        content_type: Some("image/gif".to_string()),
        ..pdf()
    });
    let errors = engine
        .validate(gif, context(&product))
        .expect_err("gif rejected");
    assert_eq!(
        errors.messages(FIELD_PROOF_DOCUMENT),
        ["Invalid file type. Allowed: PDF, JPG, PNG."]
    );

    let mut untyped = form_for(product.id);
    untyped.proof_document = Some(DocumentUpload {
        content_type: None,
        ..pdf()
    });
    assert!(engine.validate(untyped, context(&product)).is_err());

    // Declared type wins over the actual bytes.
    let mut mislabelled = form_for(product.id);
    mislabelled.proof_document = Some(DocumentUpload {
        file_name: Some("payslip.exe".to_string()),
        content_type: Some("image/png".to_string()),
        bytes: b"MZ\x90\x00".to_vec(),
    });
    let validated = engine
        .validate(mislabelled, context(&product))
        .expect("content type is trusted");
    assert_eq!(validated.document_kind, DocumentKind::Png);
}

#[test]
fn id_number_already_on_file_is_rejected() {
    let product = product();
    let context = IntakeContext {
        id_number_in_use: true,
        ..context(&product)
    };

    let errors = EligibilityEngine::new()
        .validate(form_for(product.id), context)
        .expect_err("duplicate");
    assert_eq!(errors.messages(FIELD_ID_NUMBER), [ID_ALREADY_USED]);
    assert!(!errors.has(FIELD_BIRTHDAY));
}

#[test]
fn unknown_product_is_an_invalid_choice() {
    let product = product();
    let context = IntakeContext {
        product: None,
        ..context(&product)
    };

    let errors = EligibilityEngine::new()
        .validate(form_for(ProductId(99)), context)
        .expect_err("unknown product");
    assert_eq!(
        errors.messages(FIELD_SELECTED_PHONE),
        ["Select a valid choice. That choice is not one of the available choices."]
    );
}
