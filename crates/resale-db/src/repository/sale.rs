//! # Sale Row Store
//!
//! Row-level plumbing for sales and their line items, used by the sale
//! coordinator. Every function takes the coordinator's transaction
//! connection; nothing here commits on its own.
//!
//! ## Sale Item Row Reuse
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A device can only ever have ONE active sale item (partial unique      │
//! │  index on item_id). When a device is re-sold after an undo, the        │
//! │  tombstoned row is REACTIVATED rather than re-inserted, so the row id  │
//! │  — and the audit continuity hanging off it — survives the round trip.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use resale_core::{Money, PaymentMethod, PaymentPlan, PaymentType, Sale, SaleItem};

use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str = r#"
    id, sold_at, customer_id, seller_worker_id, payment_method, payment_type,
    total_price_cents, paid_now_cents, remaining_cents, installment_months,
    first_payment_now, monthly_installment_cents, profit_cents, notes,
    is_active, created_at, updated_at, deleted_at
"#;

const SALE_ITEM_COLUMNS: &str = r#"
    id, sale_id, item_id, sale_price_cents, notes,
    is_active, created_at, updated_at, deleted_at
"#;

/// Freshly computed sale header fields, ready to persist.
#[derive(Debug, Clone)]
pub struct SaleHeader {
    pub sold_at: DateTime<Utc>,
    pub customer_id: Option<i64>,
    pub seller_worker_id: Option<i64>,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    pub plan: PaymentPlan,
    pub profit: Option<Money>,
    pub notes: Option<String>,
}

/// Row-level sale persistence.
pub struct SaleStore;

impl SaleStore {
    /// Inserts the sale header; returns the new sale id.
    pub async fn insert(
        conn: &mut SqliteConnection,
        header: &SaleHeader,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sales
                (sold_at, customer_id, seller_worker_id, payment_method, payment_type,
                 total_price_cents, paid_now_cents, remaining_cents,
                 installment_months, first_payment_now, monthly_installment_cents,
                 profit_cents, notes, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 1, ?14, ?14)
            "#,
        )
        .bind(header.sold_at)
        .bind(header.customer_id)
        .bind(header.seller_worker_id)
        .bind(header.payment_method)
        .bind(header.payment_type)
        .bind(header.plan.total_price.cents())
        .bind(header.plan.paid_now.cents())
        .bind(header.plan.remaining.cents())
        .bind(header.plan.installment_months)
        .bind(header.plan.first_payment_now)
        .bind(header.plan.monthly_installment.map(|m| m.cents()))
        .bind(header.profit.map(|p| p.cents()))
        .bind(&header.notes)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Overwrites the sale header on update. The seller and profit are
    /// create-time facts and are left untouched.
    pub async fn update_header(
        conn: &mut SqliteConnection,
        sale_id: i64,
        header: &SaleHeader,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE sales
            SET sold_at = ?2, customer_id = ?3, payment_method = ?4, payment_type = ?5,
                total_price_cents = ?6, paid_now_cents = ?7, remaining_cents = ?8,
                installment_months = ?9, first_payment_now = ?10,
                monthly_installment_cents = ?11, notes = ?12, updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(sale_id)
        .bind(header.sold_at)
        .bind(header.customer_id)
        .bind(header.payment_method)
        .bind(header.payment_type)
        .bind(header.plan.total_price.cents())
        .bind(header.plan.paid_now.cents())
        .bind(header.plan.remaining.cents())
        .bind(header.plan.installment_months)
        .bind(header.plan.first_payment_now)
        .bind(header.plan.monthly_installment.map(|m| m.cents()))
        .bind(&header.notes)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Overwrites just the money state, as re-derived by the
    /// collapse-to-first-payment step.
    pub async fn update_money_state(
        conn: &mut SqliteConnection,
        sale_id: i64,
        paid_now: Money,
        remaining: Money,
        payment_type: PaymentType,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE sales
            SET paid_now_cents = ?2, remaining_cents = ?3, payment_type = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(sale_id)
        .bind(paid_now.cents())
        .bind(remaining.cents())
        .bind(payment_type)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Active sale by id or `NotFound`.
    pub async fn get_active(conn: &mut SqliteConnection, id: i64) -> DbResult<Sale> {
        let row = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND is_active = 1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        row.ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// Active line items, oldest row first.
    pub async fn active_items(
        conn: &mut SqliteConnection,
        sale_id: i64,
    ) -> DbResult<Vec<SaleItem>> {
        let rows = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items
             WHERE sale_id = ?1 AND is_active = 1 ORDER BY id ASC"
        ))
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Sum of active line-item prices in cents (the stored total a
    /// no-item update keeps).
    pub async fn sum_active_items(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(sale_price_cents), 0) FROM sale_items
             WHERE sale_id = ?1 AND is_active = 1",
        )
        .bind(sale_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(total)
    }

    /// Inserts a sale item for a device, reusing the device's latest
    /// tombstoned row when one exists.
    ///
    /// An existing ACTIVE row is a `Conflict` (fast path — the partial
    /// unique index catches races at commit time).
    pub async fn upsert_item(
        conn: &mut SqliteConnection,
        sale_id: i64,
        item_id: i64,
        sale_price: Money,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        let latest = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items
             WHERE item_id = ?1 ORDER BY id DESC LIMIT 1"
        ))
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;

        match latest {
            Some(row) if row.is_active => Err(DbError::conflict(format!(
                "sale item for inventory item {item_id} already exists"
            ))),
            Some(row) => {
                sqlx::query(
                    r#"
                    UPDATE sale_items
                    SET sale_id = ?2, sale_price_cents = ?3, notes = ?4,
                        is_active = 1, deleted_at = NULL, updated_at = ?5
                    WHERE id = ?1
                    "#,
                )
                .bind(row.id)
                .bind(sale_id)
                .bind(sale_price.cents())
                .bind(notes)
                .bind(now)
                .execute(&mut *conn)
                .await?;
                Ok(row.id)
            }
            None => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO sale_items
                        (sale_id, item_id, sale_price_cents, notes,
                         is_active, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
                    "#,
                )
                .bind(sale_id)
                .bind(item_id)
                .bind(sale_price.cents())
                .bind(notes)
                .bind(now)
                .execute(&mut *conn)
                .await?;
                Ok(result.last_insert_rowid())
            }
        }
    }

    /// Updates price/notes on a line item that stays in the sale.
    pub async fn update_item_row(
        conn: &mut SqliteConnection,
        sale_item_id: i64,
        sale_price: Money,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE sale_items
            SET sale_price_cents = ?2, notes = ?3, updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(sale_item_id)
        .bind(sale_price.cents())
        .bind(notes)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Soft-deletes a line item dropped by an update.
    pub async fn deactivate_item(
        conn: &mut SqliteConnection,
        sale_item_id: i64,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE sale_items
            SET is_active = 0, deleted_at = ?2, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(sale_item_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
