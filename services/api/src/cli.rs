use crate::commands::{run_catalog, run_check_id, run_quote, CatalogArgs, CheckIdArgs, QuoteArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use handset_credit::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Handset Credit",
    about = "Run the phone credit application intake service and its support tools",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the loan terms for a cash price, deposit fraction, and interest rate
    Quote(QuoteArgs),
    /// Validate a national ID number and report the embedded birth date
    CheckId(CheckIdArgs),
    /// Load a catalog CSV and list the phones, optionally filtered by monthly income
    Catalog(CatalogArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the directory uploaded proof documents are written to
    #[arg(long)]
    pub(crate) upload_dir: Option<PathBuf>,
    /// Catalog CSV to seed the product list from
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Quote(args) => run_quote(args),
        Command::CheckId(args) => run_check_id(args),
        Command::Catalog(args) => run_catalog(args),
    }
}
