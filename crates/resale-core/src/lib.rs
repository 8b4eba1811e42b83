//! # resale-core: Pure Business Logic for Resale POS
//!
//! This crate is the **heart** of the resale shop's back-office. It holds
//! the commerce-ledger rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Resale POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Back-office API layer (out of scope)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ resale-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌────────────┐  │   │
//! │  │   │   types   │  │   money   │  │  payment  │  │transitions │  │   │
//! │  │   │ Inventory │  │   Money   │  │   Plan    │  │ (from,to)→ │  │   │
//! │  │   │ Sale/Wrk  │  │ Precision │  │  collapse │  │  activity  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  resale-db (Database Layer)                     │   │
//! │  │        SQLite ledgers, audit trails, sale coordinator           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (InventoryItem, Sale, Worker, etc.)
//! - [`requests`] - Write-side request payloads
//! - [`money`] - Money type with integer-cent arithmetic (no floating point!)
//! - [`payment`] - Installment plan math and the collapse derivation
//! - [`transitions`] - Status-change → audit-activity classification table
//! - [`error`] - Domain error types
//! - [`validation`] - Format normalization (month, IMEI, phone)
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64); floats exist
//!    only at the request boundary
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use resale_core::money::Money;
//! use resale_core::payment::{PaymentPlan, PaymentTerms};
//! use resale_core::types::PaymentType;
//!
//! // $600.00 over 6 months, first installment paid at the counter
//! let plan = PaymentPlan::for_create(
//!     Money::from_cents(60000),
//!     &PaymentTerms {
//!         payment_type: PaymentType::PayLater,
//!         installment_months: Some(6),
//!         first_payment_now: Some(true),
//!         paid_now: None,
//!     },
//! )
//! .unwrap();
//!
//! assert_eq!(plan.monthly_installment.unwrap().cents(), 10000);
//! assert_eq!(plan.paid_now.cents(), 10000);
//! assert_eq!(plan.remaining.cents(), 50000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod payment;
pub mod requests;
pub mod transitions;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use resale_core::Money` instead of
// `use resale_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Precision};
pub use payment::{PaymentPlan, PaymentTerms};
pub use requests::*;
pub use types::*;
