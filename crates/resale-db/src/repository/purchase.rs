//! # Purchase Intake
//!
//! Creates the purchase aggregate behind a financed intake: the purchase
//! row, its item join row, and the initial payment entry in the purchase's
//! append-only payment history. Runs inside the intake transaction.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use resale_core::{Money, PaymentMethod, PaymentType};

use crate::error::DbResult;

/// Financed-intake purchase aggregate.
pub struct PurchaseIntake;

impl PurchaseIntake {
    /// Inserts the purchase, its item row, and the initial payment entry.
    /// Returns the purchase id.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        conn: &mut SqliteConnection,
        item_id: i64,
        customer_id: Option<i64>,
        payment_method: Option<PaymentMethod>,
        pay_later: bool,
        total: Money,
        paid_now: Money,
        remaining: Money,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        let payment_type = if pay_later {
            PaymentType::PayLater
        } else {
            PaymentType::PaidNow
        };

        let result = sqlx::query(
            r#"
            INSERT INTO purchases
                (purchased_at, customer_id, payment_method, payment_type,
                 total_price_cents, paid_now_cents, remaining_cents,
                 is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)
            "#,
        )
        .bind(now)
        .bind(customer_id)
        .bind(payment_method.unwrap_or(PaymentMethod::Cash))
        .bind(payment_type)
        .bind(total.cents())
        .bind(paid_now.cents())
        .bind(remaining.cents())
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let purchase_id = result.last_insert_rowid();

        sqlx::query(
            r#"
            INSERT INTO purchase_items
                (purchase_id, item_id, purchase_price_cents, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?4)
            "#,
        )
        .bind(purchase_id)
        .bind(item_id)
        .bind(total.cents())
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let note = match payment_type {
            PaymentType::PaidNow => format!("Full payment: {paid_now}"),
            PaymentType::PayLater => {
                format!("Initial payment: {paid_now}, Remaining: {remaining}")
            }
        };

        sqlx::query(
            r#"
            INSERT INTO purchase_activities
                (purchase_id, paid_at, amount_cents, notes, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
            "#,
        )
        .bind(purchase_id)
        .bind(now)
        .bind(paid_now.cents())
        .bind(&note)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(purchase_id)
    }
}
