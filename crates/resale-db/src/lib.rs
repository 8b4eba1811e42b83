//! # resale-db: Database Layer for Resale POS
//!
//! SQLite persistence for the resale shop's commerce ledger: connection
//! pooling, embedded migrations, the aggregate repositories, and the
//! transactional sale coordinator.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    resale-db (THIS CRATE)                               │
//! │                                                                         │
//! │   Database ──┬── inventory()  InventoryLedger   item lifecycle + audit  │
//! │              ├── workers()    WorkerLedger      accrual + payouts       │
//! │              ├── customers()  CustomerDirectory ensure-by-phone upsert  │
//! │              └── sales()      SaleCoordinator   the one-transaction     │
//! │                                                 write path              │
//! │                                                                         │
//! │   Every mutating request = exactly one transaction. The partial         │
//! │   unique indexes over active rows are the authority for "one active    │
//! │   IMEI" and "don't sell the same phone twice".                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//! ```rust,no_run
//! use resale_db::{Database, DbConfig};
//!
//! # async fn demo() -> Result<(), resale_db::DbError> {
//! let db = Database::new(DbConfig::new("./resale.db")).await?;
//! let _inventory = db.inventory();
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use coordinator::SaleCoordinator;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::activity::{InventoryActivityLog, SaleActivityLog};
pub use repository::customer::CustomerDirectory;
pub use repository::inventory::InventoryLedger;
pub use repository::purchase::PurchaseIntake;
pub use repository::sale::{SaleHeader, SaleStore};
pub use repository::worker::WorkerLedger;
