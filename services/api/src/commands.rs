use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use handset_credit::error::AppError;
use handset_credit::intake::catalog::validate_product;
use handset_credit::intake::domain::DEFAULT_MAX_SALARY_MULTIPLIER;
use handset_credit::intake::{
    age_on, list_products, parse_catalog_file, validate_id_number, InMemoryRecordStore,
    LoanTerms, NewProduct, ProductView, RecordStore,
};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Cash price of the phone
    #[arg(long, value_parser = crate::infra::parse_decimal)]
    pub(crate) price: Decimal,
    /// Deposit as a fraction of the cash price (0.1 for 10%)
    #[arg(long, value_parser = crate::infra::parse_decimal)]
    pub(crate) deposit: Decimal,
    /// Interest as a fraction of the financed principal (0.15 for 15%)
    #[arg(long, value_parser = crate::infra::parse_decimal)]
    pub(crate) interest: Decimal,
}

#[derive(Args, Debug)]
pub(crate) struct CheckIdArgs {
    /// 13 digit national ID number
    pub(crate) id_number: String,
    /// Evaluation date for the century window and age (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct CatalogArgs {
    /// Catalog CSV export
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Only list phones whose monthly installment fits a tenth of this income
    #[arg(long, value_parser = crate::infra::parse_decimal)]
    pub(crate) income: Option<Decimal>,
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let terms = quote_terms(&args)?;

    println!("Loan quote");
    println!("  Cash price:          {}", args.price);
    println!("  Principal financed:  {}", terms.principal.round_dp(2));
    println!("  Total repayable:     {}", terms.total_amount.round_dp(2));
    println!("  Daily installment:   {}", terms.daily_installment.round_dp(2));
    println!("  Monthly installment: {}", terms.monthly_installment.round_dp(2));
    Ok(())
}

fn quote_terms(args: &QuoteArgs) -> Result<LoanTerms, AppError> {
    let product = NewProduct {
        make: "Quote".to_string(),
        model: "quote".to_string(),
        cash_price: args.price,
        deposit_percent: args.deposit,
        interest_rate: args.interest,
        max_salary_multiplier: DEFAULT_MAX_SALARY_MULTIPLIER,
    };
    validate_product(&product).map_err(|err| AppError::Intake(err.into()))?;
    Ok(LoanTerms::compute(args.price, args.deposit, args.interest))
}

pub(crate) fn run_check_id(args: CheckIdArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let id_number = args.id_number.trim();
    let check = validate_id_number(id_number, today.year());

    match check.date_of_birth {
        Some(birth) if check.valid => {
            println!("ID number is valid");
            println!("  Date of birth: {}", birth.format("%Y-%m-%d"));
            println!("  Age on {}: {}", today.format("%Y-%m-%d"), age_on(birth, today));
        }
        _ => println!("ID number is invalid"),
    }
    Ok(())
}

pub(crate) fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let views = load_catalog(&args)?;

    match args.income {
        Some(income) => println!("Phones affordable on a monthly income of {income}"),
        None => println!("Phone catalog"),
    }
    if views.is_empty() {
        println!("  (none)");
    }
    for view in &views {
        match &view.terms {
            Some(terms) => println!(
                "  #{} {} {}: {} cash, {} per month",
                view.id.0,
                view.make,
                view.model,
                view.cash_price,
                terms.monthly_installment.round_dp(2)
            ),
            None => println!(
                "  #{} {} {}: {} cash",
                view.id.0, view.make, view.model, view.cash_price
            ),
        }
    }
    Ok(())
}

fn load_catalog(args: &CatalogArgs) -> Result<Vec<ProductView>, AppError> {
    let store = InMemoryRecordStore::new();
    for product in parse_catalog_file(&args.csv)? {
        store
            .insert_product(product)
            .map_err(|err| AppError::Intake(err.into()))?;
    }
    list_products(&store, args.income).map_err(|err| AppError::Intake(err.into()))
}
