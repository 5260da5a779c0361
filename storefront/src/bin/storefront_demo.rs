//! Run one storefront purchase end to end against in-memory adapters.
//!
//! # Examples
//! ```sh
//! cargo run --manifest-path storefront/Cargo.toml --bin storefront-demo -- \
//!     --mode bulk --quantity 20 --data-type tdata --download-dir target/downloads
//! ```
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::fmt::Display;
use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use serde_json::json;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

use storefront::WizardSettings;
use storefront::domain::ports::{FixtureVerificationProvider, RecordingClipboard};
use storefront::domain::{
    Buyer, CopyTarget, Country, CountryDraft, DataType, Error, InventoryAccount, Locale, Money,
    PhoneNumber, PurchaseController, PurchaseFlowError, PurchasePorts, PurchaseSession,
    PurchaseType, UserFacing, VerificationOutcome,
};
use storefront::outbound::{
    DirectoryDownloadSink, InventoryFulfillment, MemoryCatalogRepository, MemoryWalletRepository,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Single,
    Bulk,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Payload {
    Sessions,
    Tdata,
}

impl From<Payload> for DataType {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Sessions => Self::Sessions,
            Payload::Tdata => Self::Tdata,
        }
    }
}

/// `storefront-demo` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "storefront-demo",
    about = "Buy placeholder accounts through the storefront wizards",
    version
)]
struct CliArgs {
    /// Purchase type.
    #[arg(long, value_enum, default_value = "single")]
    mode: Mode,
    /// Bulk quantity tier.
    #[arg(long, default_value_t = 10)]
    quantity: u32,
    /// Bulk payload format.
    #[arg(long = "data-type", value_enum, default_value = "sessions")]
    data_type: Payload,
    /// Directory bulk downloads are written to.
    #[arg(long = "download-dir", value_name = "path", default_value = "downloads")]
    download_dir: Utf8PathBuf,
    /// Starting wallet balance in whole units.
    #[arg(long, default_value_t = 1_000)]
    balance: u64,
    /// Inventory accounts seeded for the demo country.
    #[arg(long, default_value_t = 200)]
    stock: u32,
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = WizardSettings::load_from_iter([OsString::from("storefront-demo")])
        .map_err(|err| io::Error::other(err.to_string()))?;
    let locale = settings.locale();
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let country = demo_country(args.stock)?;
    let catalog = seed_catalog(&country, args.stock, Arc::clone(&clock))?;
    let buyer = Buyer::new(Uuid::new_v4(), "Demo Buyer", Money::from_units(args.balance))
        .map_err(io::Error::other)?;
    let wallet = MemoryWalletRepository::default().with_buyer(buyer.id(), buyer.balance());
    let fulfillment = InventoryFulfillment::new(Arc::new(catalog), settings.placeholder_seed())
        .with_reservation_minutes(settings.reservation_minutes());
    let downloads = DirectoryDownloadSink::open(args.download_dir.clone())
        .map_err(|err| failure(&PurchaseFlowError::from(err), locale))?;

    let ports = PurchasePorts {
        fulfillment: Arc::new(fulfillment),
        wallet: Arc::new(wallet),
        clipboard: Arc::new(RecordingClipboard::default()),
        downloads: Arc::new(downloads),
    };
    let purchase_type = match args.mode {
        Mode::Single => PurchaseType::Single,
        Mode::Bulk => PurchaseType::Bulk,
    };
    let session = PurchaseSession::open(purchase_type, country, buyer);
    let mut controller = PurchaseController::new(session, ports, clock);
    if let Some(timeout) = settings.fulfilment_timeout() {
        controller = controller.with_fulfilment_timeout(timeout);
    }

    let summary = match args.mode {
        Mode::Single => run_single(&mut controller, &settings, locale).await?,
        Mode::Bulk => run_bulk(&mut controller, &args, locale).await?,
    };
    println!("{summary:#}");
    Ok(())
}

async fn run_single(
    controller: &mut PurchaseController,
    settings: &WizardSettings,
    locale: Locale,
) -> io::Result<serde_json::Value> {
    controller.confirm().map_err(|err| failure(&err, locale))?;
    controller
        .process()
        .await
        .map_err(|err| failure(&err, locale))?;
    let login = controller
        .request_code()
        .await
        .map_err(|err| failure(&err, locale))?;
    controller
        .copy(CopyTarget::PhoneNumber)
        .await
        .map_err(|err| failure(&err, locale))?;

    let provider = Arc::new(FixtureVerificationProvider::new(login.code.clone()));
    let (verification, outcome) = controller
        .verification_for_delivery(settings.verification_policy(), provider)
        .map_err(|err| failure(&err, locale))?;
    let mut verification = verification.with_tick_period(settings.tick_period());
    verification
        .send_code()
        .await
        .map_err(|err| failure(&err, locale))?;
    verification
        .submit_code(login.code.as_str())
        .await
        .map_err(|err| failure(&err, locale))?;
    match login.two_factor_password.as_deref() {
        Some(password) => verification.submit_two_factor(password).await,
        None => verification.skip_two_factor(),
    }
    .map_err(|err| failure(&err, locale))?;
    let verified = matches!(outcome.await, Ok(VerificationOutcome::Completed(_)));

    controller
        .acknowledge()
        .map_err(|err| failure(&err, locale))?;
    let phone = controller
        .session()
        .delivered_account()
        .map(|account| account.phone_number.to_string());
    info!(verified, "single purchase finished");
    Ok(json!({
        "step": controller.session().step(),
        "phoneNumber": phone,
        "verified": verified,
    }))
}

async fn run_bulk(
    controller: &mut PurchaseController,
    args: &CliArgs,
    locale: Locale,
) -> io::Result<serde_json::Value> {
    controller.confirm().map_err(|err| failure(&err, locale))?;
    controller
        .select_quantity(args.quantity)
        .map_err(|err| failure(&err, locale))?;
    controller
        .select_data_type(args.data_type.into())
        .map_err(|err| failure(&err, locale))?;
    controller
        .process()
        .await
        .map_err(|err| failure(&err, locale))?;
    let location = controller
        .download()
        .await
        .map_err(|err| failure(&err, locale))?;
    info!(%location, "bulk purchase finished");
    Ok(json!({
        "step": controller.session().step(),
        "quantity": args.quantity,
        "download": location,
    }))
}

fn demo_country(stock: u32) -> io::Result<Country> {
    Country::try_from(CountryDraft {
        code: "sa".to_owned(),
        name: "Saudi Arabia".to_owned(),
        flag: "🇸🇦".to_owned(),
        phone_prefix: "+966".to_owned(),
        price: Money::from_cents(250),
        available: stock,
        active: true,
    })
    .map_err(io::Error::other)
}

fn seed_catalog(
    country: &Country,
    stock: u32,
    clock: Arc<dyn Clock>,
) -> io::Result<MemoryCatalogRepository> {
    let mut catalog = MemoryCatalogRepository::new(clock).with_country(country.clone());
    for offset in 0..u64::from(stock) {
        let phone = PhoneNumber::new(format!("{}55{}", country.phone_prefix(), 1_000_000 + offset))
            .map_err(io::Error::other)?;
        catalog = catalog.with_account(InventoryAccount::active(
            Uuid::new_v4(),
            country.code().clone(),
            phone,
        ));
    }
    Ok(catalog)
}

/// Logs the technical cause and returns the localised message as the error.
fn failure<E: UserFacing + Display>(err: &E, locale: Locale) -> io::Error {
    let error = Error::from_user_facing(err, locale);
    warn!(error = %err, code = ?error.code(), "demo purchase failed");
    io::Error::other(error.message().to_owned())
}
