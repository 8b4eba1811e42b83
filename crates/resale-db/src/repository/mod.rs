//! # Ledger Repositories
//!
//! One module per aggregate. Entry-point operations (create/update/pay)
//! own their transaction; the `pub async fn …(conn: &mut SqliteConnection)`
//! associated functions compose inside a caller's transaction — the sale
//! coordinator threads one connection through all of them so every side
//! effect commits or rolls back together.

pub mod activity;
pub mod customer;
pub mod inventory;
pub mod purchase;
pub mod sale;
pub mod worker;
