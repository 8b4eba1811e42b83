//! # Append-Only Audit Trails
//!
//! The child-log pattern instantiated twice: once for inventory items
//! (status history) and once for sales (payment history).
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  append(owner, …)  inserts exactly ONE immutable row                   │
//! │  latest(owner)     returns rows newest-first, tie-broken by id         │
//! │                    (ids are AUTOINCREMENT, so id order = insert order) │
//! │                                                                         │
//! │  Rows are NEVER updated in place. Corrections deactivate (soft-delete) │
//! │  and append — with one documented exception: detaching an item from a  │
//! │  sale records nothing at all.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function takes the caller's transaction connection: audit rows
//! commit or roll back together with the mutation they describe.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use resale_core::{
    InventoryActivity, InventoryActivityType, InventoryStatus, Money, SaleActivity,
};

use crate::error::DbResult;

// =============================================================================
// Inventory Activity Log
// =============================================================================

/// Append-only status history of an inventory item.
pub struct InventoryActivityLog;

impl InventoryActivityLog {
    /// Inserts exactly one immutable audit row.
    pub async fn append(
        conn: &mut SqliteConnection,
        item_id: i64,
        activity_type: InventoryActivityType,
        from_status: Option<InventoryStatus>,
        to_status: InventoryStatus,
        notes: Option<&str>,
        happened_at: DateTime<Utc>,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO inventory_activities
                (item_id, activity_type, from_status, to_status, notes, happened_at,
                 is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?6, ?6)
            "#,
        )
        .bind(item_id)
        .bind(activity_type)
        .bind(from_status)
        .bind(to_status)
        .bind(notes)
        .bind(happened_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Returns the item's audit trail, newest first.
    pub async fn latest(
        conn: &mut SqliteConnection,
        item_id: i64,
    ) -> DbResult<Vec<InventoryActivity>> {
        let rows = sqlx::query_as::<_, InventoryActivity>(
            r#"
            SELECT id, item_id, activity_type, from_status, to_status, notes,
                   happened_at, is_active, created_at, updated_at, deleted_at
            FROM inventory_activities
            WHERE item_id = ?1 AND is_active = 1
            ORDER BY happened_at DESC, id DESC
            "#,
        )
        .bind(item_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Counts all rows ever written for an item, tombstoned included.
    ///
    /// Used by tests to pin the "no activity on detach" asymmetry.
    pub async fn count_all(conn: &mut SqliteConnection, item_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM inventory_activities WHERE item_id = ?1",
        )
        .bind(item_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Sale Activity Log
// =============================================================================

/// Append-only payment history of a sale.
pub struct SaleActivityLog;

impl SaleActivityLog {
    /// Inserts exactly one immutable payment row.
    pub async fn append(
        conn: &mut SqliteConnection,
        sale_id: i64,
        paid_at: DateTime<Utc>,
        amount: Money,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sale_activities
                (sale_id, paid_at, amount_cents, notes, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
            "#,
        )
        .bind(sale_id)
        .bind(paid_at)
        .bind(amount.cents())
        .bind(notes)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Returns the sale's payment history, newest first.
    pub async fn latest(
        conn: &mut SqliteConnection,
        sale_id: i64,
    ) -> DbResult<Vec<SaleActivity>> {
        let rows = sqlx::query_as::<_, SaleActivity>(
            r#"
            SELECT id, sale_id, paid_at, amount_cents, notes,
                   is_active, created_at, updated_at, deleted_at
            FROM sale_activities
            WHERE sale_id = ?1 AND is_active = 1
            ORDER BY paid_at DESC, id DESC
            "#,
        )
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Returns active payments earliest-first (the collapse step keeps the
    /// head of this ordering).
    pub async fn active_in_payment_order(
        conn: &mut SqliteConnection,
        sale_id: i64,
    ) -> DbResult<Vec<SaleActivity>> {
        let rows = sqlx::query_as::<_, SaleActivity>(
            r#"
            SELECT id, sale_id, paid_at, amount_cents, notes,
                   is_active, created_at, updated_at, deleted_at
            FROM sale_activities
            WHERE sale_id = ?1 AND is_active = 1
            ORDER BY paid_at ASC, id ASC
            "#,
        )
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Soft-deletes one payment row. The row itself is never mutated
    /// beyond its tombstone flags.
    pub async fn deactivate(
        conn: &mut SqliteConnection,
        activity_id: i64,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE sale_activities
            SET is_active = 0, deleted_at = ?2, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(activity_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
