//! # Request Types
//!
//! Deserialized write-side requests consumed by the ledgers and the sale
//! coordinator. These are pure data: monetary fields arrive as raw f64 and
//! are parsed into [`Money`](crate::money::Money) exactly once at the top
//! of each operation.
//!
//! Patch semantics on update requests: `None` means "leave unchanged";
//! for optional text fields, `Some("")` clears the stored value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{InventoryStatus, PaymentMethod, PaymentType, PhoneCondition, SalaryType};

// =============================================================================
// Sale Requests
// =============================================================================

/// One line item of a sale request; the device is referenced by id or IMEI.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItemRequest {
    pub item_id: Option<i64>,
    pub imei: Option<String>,
    pub sale_price: f64,
    pub notes: Option<String>,
}

/// Inline customer payload; resolved through the customer directory's
/// ensure-by-phone upsert.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleCustomerRequest {
    pub full_name: Option<String>,
    pub phone_number: String,
    pub address: Option<String>,
    pub passport_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateSaleRequest {
    #[ts(as = "Option<String>")]
    pub sold_at: Option<DateTime<Utc>>,
    pub customer_id: Option<i64>,
    pub seller_worker_id: Option<i64>,
    pub customer: Option<SaleCustomerRequest>,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    /// Explicit up-front amount; only consulted for PAY_LATER sales whose
    /// first installment is deferred.
    pub paid_now: Option<f64>,
    pub installment_months: Option<i64>,
    pub first_payment_now: Option<bool>,
    pub profit: Option<f64>,
    pub notes: Option<String>,
    pub items: Vec<SaleItemRequest>,
}

/// Customer patch on a sale update; name and phone must come together.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateSaleCustomerRequest {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateSaleRequest {
    #[ts(as = "Option<String>")]
    pub sold_at: Option<DateTime<Utc>>,
    pub customer_id: Option<i64>,
    pub customer: Option<UpdateSaleCustomerRequest>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_type: Option<PaymentType>,
    pub installment_months: Option<i64>,
    pub first_payment_now: Option<bool>,
    pub notes: Option<String>,
    /// When present and non-empty, the sale's item set is reconciled
    /// against this list; when absent, the stored total is kept.
    pub items: Option<Vec<SaleItemRequest>>,
}

// =============================================================================
// Inventory Requests
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateInventoryItemRequest {
    /// Blank IMEI gets an auto-generated surrogate.
    pub imei: Option<String>,
    pub serial_number: Option<String>,
    pub brand: String,
    pub model: String,
    pub storage: Option<String>,
    pub color: Option<String>,
    pub condition: PhoneCondition,
    pub known_issues: Option<String>,
    pub expected_sale_price: f64,
    /// Intake is a purchase from a customer (financed intake path).
    pub purchased: bool,
    pub payment_type: Option<PaymentType>,
    pub payment_method: Option<PaymentMethod>,
    /// PAY_LATER intake only; must not exceed the phone price.
    pub initial_payment: Option<f64>,
    pub customer: Option<SaleCustomerRequest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateInventoryItemRequest {
    pub imei: Option<String>,
    pub serial_number: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub storage: Option<String>,
    pub color: Option<String>,
    pub condition: Option<PhoneCondition>,
    pub status: Option<InventoryStatus>,
    pub known_issues: Option<String>,
    pub expected_sale_price: Option<f64>,
}

// =============================================================================
// Worker Requests
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateWorkerRequest {
    pub full_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub salary_type: SalaryType,
    /// Required > 0 when salary_type is MONTHLY.
    pub monthly_salary: Option<f64>,
    /// Required > 0 when salary_type is PERCENT; percent of profit.
    pub salary_percent: Option<f64>,
    pub notes: Option<String>,
}

/// Salary-shape change; switching type zeroes the other field.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateWorkerSalaryRequest {
    pub salary_type: SalaryType,
    pub monthly_salary: Option<f64>,
    pub salary_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaySalaryRequest {
    /// Target month, normalized to `YYYY-MM`.
    pub month: String,
    pub amount_paid: f64,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}
