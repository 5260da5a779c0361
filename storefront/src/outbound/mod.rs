//! Outbound adapters implementing domain ports.
//!
//! Adapters are thin translators between domain types and the backing store.
//! They contain no wizard logic:
//!
//! - **memory_catalog**: country catalogue and inventory held in memory
//! - **memory_wallet**: wallet ledger, purchase history and notifications
//! - **inventory_fulfillment**: fulfilment that sells catalogue inventory
//! - **download**: filesystem sink for bulk download artefacts

pub mod download;
pub mod inventory_fulfillment;
pub mod memory_catalog;
pub mod memory_wallet;

pub use download::DirectoryDownloadSink;
pub use inventory_fulfillment::InventoryFulfillment;
pub use memory_catalog::MemoryCatalogRepository;
pub use memory_wallet::MemoryWalletRepository;
