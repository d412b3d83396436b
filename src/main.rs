use clap::{Args, Parser, Subcommand, ValueEnum};
use grampay::application::authorizer::{AuthorizerConfig, PaymentAuthorizer, PaymentOutcome};
use grampay::application::resolver::PayeeResolver;
use grampay::domain::payee::PayeeDescriptor;
use grampay::domain::ports::SecretStoreBox;
use grampay::domain::session::{Amount, Balance};
use grampay::error::PaymentError;
use grampay::infrastructure::in_memory::{
    InMemoryContactSource, InMemoryPaymentService, InMemorySecretStore,
};
use grampay::interfaces::csv::contact_reader::ContactReader;
use grampay::interfaces::csv::contact_writer::ContactIndexWriter;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a scanned UPI QR payload and print the payee as JSON
    Decode {
        /// The deep link, e.g. upi://pay?pa=shop@ybl&pn=Shop
        uri: String,
    },
    /// Index a contacts CSV export (name,phone_numbers) under A-Z headers
    Contacts {
        /// Input contacts CSV file
        input: PathBuf,

        /// Keep only contacts whose name or number contains this text
        #[arg(long)]
        search: Option<String>,

        /// Print the position of this letter's header instead of the index
        #[arg(long)]
        letter: Option<char>,
    },
    /// Authorize and submit one payment against the simulated service
    Pay(PayArgs),
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct PayeeArgs {
    /// Scanned UPI deep link
    #[arg(long)]
    qr: Option<String>,

    /// Contact phone number, paid through its synthetic UPI address
    #[arg(long)]
    phone: Option<String>,

    /// UPI address typed in by hand
    #[arg(long)]
    vpa: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Simulation {
    Success,
    Fraud,
    Reject,
    Offline,
}

#[derive(Args)]
struct PayArgs {
    #[command(flatten)]
    payee: PayeeArgs,

    /// Payee display name for --phone and --vpa
    #[arg(long, default_value = "")]
    name: String,

    /// Amount in rupees
    #[arg(long)]
    amount: String,

    /// UPI PIN; enrolled on first use
    #[arg(long)]
    pin: String,

    /// OTP codes to try in order until one is accepted
    #[arg(long, required = true)]
    otp: Vec<String>,

    /// Bearer token stored as if obtained at login
    #[arg(long, default_value = "local-session")]
    auth_token: String,

    /// Behaviour of the simulated payment service
    #[arg(long, value_enum, default_value_t = Simulation::Success)]
    simulate: Simulation,

    /// Opening balance of the simulated account, in rupees
    #[arg(long, default_value = "10000")]
    opening_balance: Decimal,

    /// Path to persistent secret storage (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[derive(Serialize)]
struct PaymentReport<'a> {
    payee: &'a PayeeDescriptor,
    amount: Option<Amount>,
    idempotency_token: String,
    #[serde(flatten)]
    outcome: PaymentOutcome,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Decode { uri } => decode(&uri),
        Command::Contacts {
            input,
            search,
            letter,
        } => contacts(input, search, letter).await,
        Command::Pay(args) => pay(args).await,
    }
}

fn decode(uri: &str) -> Result<()> {
    let resolver = PayeeResolver::new(Box::new(InMemoryContactSource::default()));
    let payee = resolver.resolve_qr(uri)?;
    serde_json::to_writer(io::stdout().lock(), &payee).into_diagnostic()?;
    println!();
    Ok(())
}

async fn contacts(input: PathBuf, search: Option<String>, letter: Option<char>) -> Result<()> {
    let file = File::open(input).into_diagnostic()?;
    let mut device_contacts = Vec::new();
    for contact in ContactReader::new(file).contacts() {
        match contact {
            Ok(contact) => device_contacts.push(contact),
            Err(e) => tracing::warn!("Error reading contact: {e}"),
        }
    }

    let resolver = PayeeResolver::new(Box::new(InMemoryContactSource::new(device_contacts)));
    let index = resolver.contact_index().await?;
    let index = index.search(search.as_deref().unwrap_or_default());

    if let Some(letter) = letter {
        match index.locate_bucket(letter) {
            Some(position) => println!("{position}"),
            None => miette::bail!("no contacts under '{}'", letter.to_ascii_uppercase()),
        }
        return Ok(());
    }

    let stdout = io::stdout();
    let mut writer = ContactIndexWriter::new(stdout.lock());
    writer.write_index(&index)?;
    Ok(())
}

fn open_secret_store(db_path: Option<PathBuf>) -> Result<SecretStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store =
                grampay::infrastructure::rocksdb::RocksDBSecretStore::open(path).into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Box::new(InMemorySecretStore::new()))
        }
        None => Ok(Box::new(InMemorySecretStore::new())),
    }
}

async fn simulated_service(args: &PayArgs) -> Result<InMemoryPaymentService> {
    let service = InMemoryPaymentService::new(Balance::new(args.opening_balance));
    match args.simulate {
        Simulation::Success => {}
        Simulation::Fraud => {
            let threshold = Amount::from_minor_units(1).into_diagnostic()?;
            service
                .flag_fraud_from(threshold, "Unusual payee for this account")
                .await;
        }
        Simulation::Reject => service.reject_submissions("Invalid OTP").await,
        Simulation::Offline => service.set_offline(true).await,
    }
    Ok(service)
}

async fn pay(args: PayArgs) -> Result<()> {
    let config = AuthorizerConfig::default();
    let secrets = open_secret_store(args.db_path.clone())?;
    secrets
        .set_secret(&config.auth_token_key, &args.auth_token)
        .await?;

    let resolver = PayeeResolver::new(Box::new(InMemoryContactSource::default()));
    let payee = match (&args.payee.qr, &args.payee.phone, &args.payee.vpa) {
        (Some(uri), _, _) => resolver.resolve_qr(uri)?,
        (_, Some(phone), _) => PayeeDescriptor::from_contact(&args.name, phone)?,
        (_, _, Some(vpa)) => PayeeDescriptor::manual(vpa.as_str(), args.name.as_str())?,
        (None, None, None) => miette::bail!("a payee is required"),
    };

    let service = simulated_service(&args).await?;
    let mut authorizer = PaymentAuthorizer::new(payee, secrets, Box::new(service), config);
    authorizer.enter_amount(&args.amount)?;
    authorizer.submit_pin(&args.pin).await?;

    let mut last_error = None;
    for code in &args.otp {
        match authorizer.submit_otp(code).await {
            Ok(outcome) => {
                let session = authorizer.session();
                let report = PaymentReport {
                    payee: session.payee(),
                    amount: session.amount(),
                    idempotency_token: session.idempotency_token().to_string(),
                    outcome,
                };
                serde_json::to_writer(io::stdout().lock(), &report).into_diagnostic()?;
                println!();
                return Ok(());
            }
            Err(e @ (PaymentError::SubmissionFailed(_) | PaymentError::NetworkError(_))) => {
                tracing::warn!("Payment attempt failed: {e}");
                last_error = Some(e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    authorizer.cancel()?;
    match last_error {
        Some(e) => Err(e.into()),
        None => miette::bail!("no OTP accepted"),
    }
}
