//! # Domain Types
//!
//! Core domain types used throughout Resale POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryItem   │   │      Sale       │   │     Worker      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  imei (natural) │   │  payment_type   │   │  salary_type    │       │
//! │  │  status         │   │  total / paid / │   │  accrued cents  │       │
//! │  │  sale_id link   │   │  remaining      │   │  sold counters  │       │
//! │  └────────┬────────┘   └────────┬────────┘   └────────┬────────┘       │
//! │           │ owns               │ owns                │ owns            │
//! │  InventoryActivity     SaleItem + SaleActivity   WorkerSalaryPayment   │
//! │       (append-only)        (append-only log)       (append-only)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - Every row id is an i64 `INTEGER PRIMARY KEY AUTOINCREMENT`; audit
//!   trails tie-break their ordering on id, so ids are insertion-ordered.
//! - Every monetary column is integer cents (`*_cents`); accessor methods
//!   lift them into [`Money`].
//! - Every table carries the soft-delete envelope
//!   (`is_active`/`deleted_at`/`created_at`/`updated_at`). Uniqueness and
//!   lookups are scoped to active rows only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Inventory Status
// =============================================================================

/// Lifecycle state of a physical device.
///
/// There is no formal terminal state: SOLD and RETURNED can be revisited
/// by corrective edits (a sale update that drops the item puts it back
/// IN_STOCK).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryStatus {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "IN_STOCK"))]
    InStock,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "IN_REPAIR"))]
    InRepair,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "READY_FOR_SALE"))]
    ReadyForSale,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "SOLD"))]
    Sold,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "RETURNED"))]
    Returned,
}

impl InventoryStatus {
    /// Storage/API spelling of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            InventoryStatus::InStock => "IN_STOCK",
            InventoryStatus::InRepair => "IN_REPAIR",
            InventoryStatus::ReadyForSale => "READY_FOR_SALE",
            InventoryStatus::Sold => "SOLD",
            InventoryStatus::Returned => "RETURNED",
        }
    }

    /// Whether a sale may pick this item up.
    pub const fn is_sellable(self) -> bool {
        matches!(self, InventoryStatus::InStock | InventoryStatus::ReadyForSale)
    }
}

impl std::fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Inventory Activity Type
// =============================================================================

/// Classification of an audit-trail entry on an inventory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryActivityType {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "CREATED"))]
    Created,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PURCHASED"))]
    Purchased,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "SOLD"))]
    Sold,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "STATUS_CHANGED"))]
    StatusChanged,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "MOVED_TO_REPAIR"))]
    MovedToRepair,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "MARKED_DONE"))]
    MarkedDone,
}

// =============================================================================
// Payment Method / Type
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "CASH"))]
    Cash,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "CARD"))]
    Card,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "TRANSFER"))]
    Transfer,
}

/// Whether the sale settles immediately or over installments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PAID_NOW"))]
    PaidNow,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PAY_LATER"))]
    PayLater,
}

// =============================================================================
// Phone Condition
// =============================================================================

/// Cosmetic/functional grade of a device at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhoneCondition {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "NEW"))]
    New,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "LIKE_NEW"))]
    LikeNew,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "GOOD"))]
    Good,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "FAIR"))]
    Fair,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "POOR"))]
    Poor,
}

// =============================================================================
// Salary Type
// =============================================================================

/// How a worker is compensated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalaryType {
    /// Fixed monthly salary; "remaining" is derived at read time,
    /// never stored.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "MONTHLY"))]
    Monthly,
    /// Percent of sale profit, accrued per sale and drawn down by payouts.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PERCENT"))]
    Percent,
}

// =============================================================================
// Inventory Item
// =============================================================================

/// A physical device tracked through purchase, repair, and sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryItem {
    pub id: i64,

    /// Unique hardware identifier; natural key, unique among active rows.
    pub imei: String,

    pub serial_number: Option<String>,
    pub brand: String,
    pub model: String,
    pub storage: Option<String>,
    pub color: Option<String>,
    pub condition: PhoneCondition,
    pub status: InventoryStatus,
    pub known_issues: Option<String>,

    /// Asking price in cents.
    pub expected_sale_price_cents: Option<i64>,

    /// Purchase that brought the device in, when intake was financed.
    pub purchase_id: Option<i64>,

    /// Sale that disposed of the device, while attached.
    pub sale_id: Option<i64>,

    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl InventoryItem {
    /// Returns the asking price as Money.
    #[inline]
    pub fn expected_sale_price(&self) -> Option<Money> {
        self.expected_sale_price_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Inventory Activity
// =============================================================================

/// Append-only audit row on an inventory item.
///
/// Created once per mutating event on the owning item; never updated.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryActivity {
    pub id: i64,
    pub item_id: i64,
    pub activity_type: InventoryActivityType,
    pub from_status: Option<InventoryStatus>,
    pub to_status: InventoryStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub happened_at: DateTime<Utc>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Sale
// =============================================================================

/// One commercial transaction, possibly paid over installments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
    pub customer_id: Option<i64>,
    pub seller_worker_id: Option<i64>,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    pub total_price_cents: i64,
    pub paid_now_cents: i64,
    /// Invariant: `remaining == total_price - paid_now` and `remaining >= 0`.
    pub remaining_cents: i64,
    pub installment_months: Option<i64>,
    pub first_payment_now: Option<bool>,
    pub monthly_installment_cents: Option<i64>,
    pub profit_cents: Option<i64>,
    pub notes: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }

    #[inline]
    pub fn paid_now(&self) -> Money {
        Money::from_cents(self.paid_now_cents)
    }

    #[inline]
    pub fn remaining(&self) -> Money {
        Money::from_cents(self.remaining_cents)
    }

    #[inline]
    pub fn monthly_installment(&self) -> Option<Money> {
        self.monthly_installment_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// Join row binding one inventory item to one sale at an agreed price.
///
/// At most one ACTIVE sale item exists per inventory item at any time;
/// tombstoned rows are reactivated rather than re-inserted so the row id
/// (and everything referencing it) stays stable across undo/redo edits.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub item_id: i64,
    pub sale_price_cents: i64,
    pub notes: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SaleItem {
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }
}

// =============================================================================
// Sale Activity
// =============================================================================

/// Append-only payment-history row on a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleActivity {
    pub id: i64,
    pub sale_id: i64,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
    pub amount_cents: i64,
    pub notes: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SaleActivity {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Worker
// =============================================================================

/// A staff member whose sales accrue commission counters.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Worker {
    pub id: i64,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub salary_type: SalaryType,
    pub monthly_salary_cents: i64,
    /// Percent of profit in basis points (1000 = 10.00%), PERCENT workers only.
    pub salary_percent_bps: Option<i64>,
    pub sold_phones_count: i64,
    pub total_sold_cents: i64,
    pub total_profit_cents: i64,
    /// Running unpaid balance of percent-based salary.
    pub percent_salary_accrued_cents: i64,
    pub notes: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Worker {
    #[inline]
    pub fn monthly_salary(&self) -> Money {
        Money::from_cents(self.monthly_salary_cents)
    }

    #[inline]
    pub fn percent_salary_accrued(&self) -> Money {
        Money::from_cents(self.percent_salary_accrued_cents)
    }
}

// =============================================================================
// Worker Salary Payment
// =============================================================================

/// Append-only payout record against a worker.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct WorkerSalaryPayment {
    pub id: i64,
    pub worker_id: i64,
    /// Normalized `YYYY-MM`.
    pub month: String,
    pub amount_paid_cents: i64,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl WorkerSalaryPayment {
    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_cents(self.amount_paid_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer record, keyed naturally by phone number.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub full_name: String,
    pub phone_number: String,
    pub address: Option<String>,
    pub passport_id: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Purchase
// =============================================================================

/// A purchase that brought devices into stock (financed intake).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub id: i64,
    #[ts(as = "String")]
    pub purchased_at: DateTime<Utc>,
    pub customer_id: Option<i64>,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    pub total_price_cents: i64,
    pub paid_now_cents: i64,
    pub remaining_cents: i64,
    pub notes: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Detail Views
// =============================================================================

/// An inventory item with its full audit trail, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryItemDetail {
    pub item: InventoryItem,
    pub activities: Vec<InventoryActivity>,
}

/// A sale with its active line items and payment history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub activities: Vec<SaleActivity>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_matches_storage_spelling() {
        assert_eq!(InventoryStatus::InStock.to_string(), "IN_STOCK");
        assert_eq!(InventoryStatus::ReadyForSale.to_string(), "READY_FOR_SALE");
    }

    #[test]
    fn test_sellable_states() {
        assert!(InventoryStatus::InStock.is_sellable());
        assert!(InventoryStatus::ReadyForSale.is_sellable());
        assert!(!InventoryStatus::InRepair.is_sellable());
        assert!(!InventoryStatus::Sold.is_sellable());
        assert!(!InventoryStatus::Returned.is_sellable());
    }

    #[test]
    fn test_enum_serde_spelling() {
        assert_eq!(
            serde_json::to_string(&PaymentType::PaidNow).unwrap(),
            "\"PAID_NOW\""
        );
        assert_eq!(
            serde_json::to_string(&InventoryActivityType::MovedToRepair).unwrap(),
            "\"MOVED_TO_REPAIR\""
        );
        let parsed: SalaryType = serde_json::from_str("\"PERCENT\"").unwrap();
        assert_eq!(parsed, SalaryType::Percent);
    }
}
