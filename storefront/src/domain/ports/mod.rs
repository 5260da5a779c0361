//! Domain ports and supporting types for the hexagonal boundary.
//!
//! The wizards never talk to infrastructure directly. Controllers receive
//! these traits as `Arc<dyn _>` so demos and tests can swap in fixtures.

mod macros;
pub(crate) use macros::define_port_error;

mod account_fulfillment;
mod catalog_repository;
mod clipboard;
mod download_sink;
mod verification_provider;
mod wallet_repository;

pub(crate) use account_fulfillment::{delivered_from_seed, payload_kind};
#[cfg(test)]
pub use account_fulfillment::MockAccountFulfillment;
pub use account_fulfillment::{
    AccountFulfillment, AccountFulfillmentError, FixtureAccountFulfillment, FulfilmentRequest,
};
#[cfg(test)]
pub use catalog_repository::MockCatalogRepository;
pub use catalog_repository::{
    CatalogRepository, CatalogRepositoryError, DEFAULT_RESERVATION_MINUTES,
    FixtureCatalogRepository,
};
#[cfg(test)]
pub use clipboard::MockClipboard;
pub use clipboard::{Clipboard, ClipboardError, RecordingClipboard};
#[cfg(test)]
pub use download_sink::MockDownloadSink;
pub use download_sink::{DownloadSink, DownloadSinkError, RecordingDownloadSink};
#[cfg(test)]
pub use verification_provider::MockVerificationProvider;
pub use verification_provider::{
    CodeCheck, FixtureVerificationProvider, VerificationProvider, VerificationProviderError,
};
#[cfg(test)]
pub use wallet_repository::MockWalletRepository;
pub use wallet_repository::{WalletRepository, WalletRepositoryError};
