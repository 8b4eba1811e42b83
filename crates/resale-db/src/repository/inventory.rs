//! # Inventory Ledger
//!
//! Owns the inventory item lifecycle and its audit trail.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   intake                                                                │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  IN_STOCK ──► IN_REPAIR ──► READY_FOR_SALE ──► SOLD ──► (detach)       │
//! │     ▲              │               │             │          │           │
//! │     └──────────────┴───────────────┴─────────────┘──────────┘           │
//! │                                                                         │
//! │  No formal terminal state: SOLD and RETURNED can be revisited by        │
//! │  corrective edits. Every status change appends one audit row via the    │
//! │  transition table — except detaching from a sale, which appends         │
//! │  nothing (preserved asymmetry).                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! IMEI is the natural key: at most one ACTIVE row per IMEI system-wide,
//! enforced by a partial unique index. Re-intake of a tombstoned IMEI
//! reactivates the old row so the device's audit history stays attached.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use resale_core::transitions::{classify_status_change, status_change_note};
use resale_core::validation::validate_imei;
use resale_core::{
    CoreError, CreateInventoryItemRequest, InventoryActivityType, InventoryItem,
    InventoryItemDetail, InventoryStatus, Money, PaymentType, Precision,
    UpdateInventoryItemRequest, ValidationError,
};

use crate::error::{DbError, DbResult};
use crate::repository::activity::InventoryActivityLog;
use crate::repository::customer::CustomerDirectory;
use crate::repository::purchase::PurchaseIntake;

const ITEM_COLUMNS: &str = r#"
    id, imei, serial_number, brand, model, storage, color, condition, status,
    known_issues, expected_sale_price_cents, purchase_id, sale_id,
    is_active, created_at, updated_at, deleted_at
"#;

/// Inventory item lifecycle operations.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLedger { pool }
    }

    // =========================================================================
    // Intake
    // =========================================================================

    /// Creates (or re-intakes) an inventory item.
    ///
    /// Appends a CREATED audit row; financed intake additionally creates
    /// the linked purchase aggregate and appends a PURCHASED row — all in
    /// one transaction.
    pub async fn create_item(&self, request: CreateInventoryItemRequest) -> DbResult<InventoryItem> {
        let now = Utc::now();

        let expected_price = Money::parse_numeric(request.expected_sale_price, "expected_sale_price")?
            .ensure_fits_precision("expected_sale_price", Precision::Standard)?;

        let imei = match request.imei.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => validate_imei(raw).map_err(CoreError::from)?,
            _ => auto_imei(now),
        };

        let pay_later = request.purchased && request.payment_type == Some(PaymentType::PayLater);
        let initial_payment = if pay_later {
            let initial = Money::parse_numeric(request.initial_payment.unwrap_or(0.0), "initial_payment")?
                .ensure_fits_precision("initial_payment", Precision::Standard)?;
            if initial > expected_price {
                return Err(ValidationError::MustNotExceed {
                    field: "initial_payment".to_string(),
                    limit_field: "expected_sale_price".to_string(),
                }
                .into());
            }
            initial
        } else {
            Money::zero()
        };

        let mut tx = self.pool.begin().await?;

        // Fast-path IMEI check; the partial unique index is authoritative
        let existing = Self::find_latest_by_imei(&mut tx, &imei).await?;
        if existing.as_ref().is_some_and(|row| row.is_active) {
            return Err(DbError::conflict("IMEI already exists"));
        }

        // Financed PAY_LATER intake records who we owe money to
        let customer_id = match (&request.customer, pay_later) {
            (Some(customer), true) if !customer.phone_number.trim().is_empty() => {
                Some(CustomerDirectory::ensure(&mut tx, customer, now).await?.id)
            }
            _ => None,
        };

        let item_id = match existing {
            Some(row) => {
                debug!(item_id = row.id, imei = %imei, "Re-intaking tombstoned inventory row");
                Self::overwrite_for_intake(&mut tx, row.id, &request, &imei, expected_price, now)
                    .await?;
                row.id
            }
            None => Self::insert_for_intake(&mut tx, &request, &imei, expected_price, now).await?,
        };

        InventoryActivityLog::append(
            &mut tx,
            item_id,
            InventoryActivityType::Created,
            None,
            InventoryStatus::InStock,
            Some("Inventory item created"),
            now,
        )
        .await?;

        if request.purchased {
            let total = expected_price;
            let paid_now = if pay_later { initial_payment.min(total) } else { total };
            let remaining = (total - paid_now).max(Money::zero());

            let purchase_id = PurchaseIntake::create(
                &mut tx,
                item_id,
                customer_id,
                request.payment_method,
                pay_later,
                total,
                paid_now,
                remaining,
                now,
            )
            .await?;

            sqlx::query("UPDATE inventory_items SET purchase_id = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(item_id)
                .bind(purchase_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;

            InventoryActivityLog::append(
                &mut tx,
                item_id,
                InventoryActivityType::Purchased,
                None,
                InventoryStatus::InStock,
                Some(&format!("Phone purchased for {total}")),
                now,
            )
            .await?;
        }

        tx.commit().await?;

        let mut conn = self.pool.acquire().await?;
        Self::get_active(&mut conn, item_id).await
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Applies field changes; a status change is classified through the
    /// transition table and logged atomically with the field update.
    pub async fn update_item(
        &self,
        id: i64,
        request: UpdateInventoryItemRequest,
    ) -> DbResult<InventoryItem> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut item = Self::get_active(&mut tx, id).await?;

        if let Some(raw) = request.imei.as_deref() {
            let next_imei = validate_imei(raw).map_err(CoreError::from)?;
            if next_imei != item.imei {
                let collision: Option<i64> = sqlx::query_scalar(
                    "SELECT id FROM inventory_items WHERE imei = ?1 AND is_active = 1 AND id != ?2",
                )
                .bind(&next_imei)
                .bind(item.id)
                .fetch_optional(&mut *tx)
                .await?;
                if collision.is_some() {
                    return Err(DbError::conflict("IMEI already exists"));
                }
            }
            item.imei = next_imei;
        }

        if let Some(serial) = request.serial_number.as_deref() {
            item.serial_number = none_if_blank(serial);
        }
        if let Some(brand) = request.brand.as_deref() {
            item.brand = brand.trim().to_string();
        }
        if let Some(model) = request.model.as_deref() {
            item.model = model.trim().to_string();
        }
        if let Some(storage) = request.storage.as_deref() {
            item.storage = none_if_blank(storage);
        }
        if let Some(color) = request.color.as_deref() {
            item.color = none_if_blank(color);
        }
        if let Some(condition) = request.condition {
            item.condition = condition;
        }
        if let Some(known_issues) = request.known_issues.as_deref() {
            item.known_issues = none_if_blank(known_issues);
        }
        if let Some(price) = request.expected_sale_price {
            item.expected_sale_price_cents = Some(
                Money::parse_numeric(price, "expected_sale_price")?
                    .ensure_fits_precision("expected_sale_price", Precision::Standard)?
                    .cents(),
            );
        }

        let prev_status = item.status;
        if let Some(status) = request.status {
            item.status = status;
        }

        sqlx::query(
            r#"
            UPDATE inventory_items
            SET imei = ?2, serial_number = ?3, brand = ?4, model = ?5,
                storage = ?6, color = ?7, condition = ?8, status = ?9,
                known_issues = ?10, expected_sale_price_cents = ?11, updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(item.id)
        .bind(&item.imei)
        .bind(&item.serial_number)
        .bind(&item.brand)
        .bind(&item.model)
        .bind(&item.storage)
        .bind(&item.color)
        .bind(item.condition)
        .bind(item.status)
        .bind(&item.known_issues)
        .bind(item.expected_sale_price_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if let Some(kind) = classify_status_change(prev_status, item.status) {
            let note = status_change_note(kind, prev_status, item.status);
            InventoryActivityLog::append(
                &mut tx,
                item.id,
                kind,
                Some(prev_status),
                item.status,
                Some(&note),
                now,
            )
            .await?;
        }

        tx.commit().await?;

        let mut conn = self.pool.acquire().await?;
        Self::get_active(&mut conn, id).await
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Soft-deletes an item. The row and its audit history stay behind;
    /// re-intaking the same IMEI later reactivates this row.
    pub async fn delete_item(&self, id: i64) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let item = Self::get_active(&mut tx, id).await?;

        sqlx::query(
            "UPDATE inventory_items SET is_active = 0, deleted_at = ?2, updated_at = ?2 WHERE id = ?1",
        )
        .bind(item.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Item plus its audit trail, newest activity first.
    pub async fn get_detail(&self, id: i64) -> DbResult<InventoryItemDetail> {
        let mut conn = self.pool.acquire().await?;
        let item = Self::get_active(&mut conn, id).await?;
        let activities = InventoryActivityLog::latest(&mut conn, id).await?;
        Ok(InventoryItemDetail { item, activities })
    }

    // =========================================================================
    // In-transaction operations
    // =========================================================================

    /// Active item by id or `NotFound`.
    pub async fn get_active(conn: &mut SqliteConnection, id: i64) -> DbResult<InventoryItem> {
        let row = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?1 AND is_active = 1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        row.ok_or_else(|| DbError::not_found("Inventory item", id))
    }

    /// Resolves an item by id or IMEI, whichever the request carries.
    pub async fn find_active_by_id_or_imei(
        conn: &mut SqliteConnection,
        item_id: Option<i64>,
        imei: Option<&str>,
    ) -> DbResult<InventoryItem> {
        if let Some(id) = item_id {
            return Self::get_active(conn, id).await;
        }

        let imei = imei.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
            CoreError::from(ValidationError::Required {
                field: "item_id or imei".to_string(),
            })
        })?;

        let row = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE imei = ?1 AND is_active = 1"
        ))
        .bind(imei)
        .fetch_optional(&mut *conn)
        .await?;

        row.ok_or_else(|| DbError::not_found("Inventory item", imei))
    }

    /// Latest row for an IMEI, tombstoned rows included.
    pub async fn find_latest_by_imei(
        conn: &mut SqliteConnection,
        imei: &str,
    ) -> DbResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE imei = ?1 ORDER BY id DESC LIMIT 1"
        ))
        .bind(imei)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row)
    }

    /// Flips the item to SOLD, links the sale, and appends the SOLD audit
    /// row with the agreed price.
    ///
    /// ## Errors
    /// - `Conflict` when an active sale item already references the device
    ///   (fast path; the partial unique index backs this at commit time)
    /// - `NotSellable` when the status is not IN_STOCK or READY_FOR_SALE
    pub async fn attach_to_sale(
        conn: &mut SqliteConnection,
        item: &InventoryItem,
        sale_id: i64,
        sale_price: Money,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let already_sold: Option<i64> =
            sqlx::query_scalar("SELECT id FROM sale_items WHERE item_id = ?1 AND is_active = 1")
                .bind(item.id)
                .fetch_optional(&mut *conn)
                .await?;
        if already_sold.is_some() {
            return Err(DbError::conflict(format!(
                "sale item for inventory item {} already exists",
                item.id
            )));
        }

        if !item.status.is_sellable() {
            return Err(CoreError::NotSellable {
                item_id: item.id,
                status: item.status,
            }
            .into());
        }

        sqlx::query(
            "UPDATE inventory_items SET status = ?2, sale_id = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(item.id)
        .bind(InventoryStatus::Sold)
        .bind(sale_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        InventoryActivityLog::append(
            conn,
            item.id,
            InventoryActivityType::Sold,
            Some(item.status),
            InventoryStatus::Sold,
            Some(&format!("Phone sold for {sale_price}")),
            now,
        )
        .await?;

        Ok(())
    }

    /// Clears the sale link and returns a SOLD item to IN_STOCK.
    ///
    /// Appends NO audit row. Every other status change writes one; this
    /// asymmetry is documented, preserved behavior.
    pub async fn detach_from_sale(
        conn: &mut SqliteConnection,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE inventory_items
            SET sale_id = NULL,
                status = CASE WHEN status = 'SOLD' THEN 'IN_STOCK' ELSE status END,
                updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(item_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Intake row plumbing
    // =========================================================================

    async fn insert_for_intake(
        conn: &mut SqliteConnection,
        request: &CreateInventoryItemRequest,
        imei: &str,
        expected_price: Money,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO inventory_items
                (imei, serial_number, brand, model, storage, color, condition,
                 status, known_issues, expected_sale_price_cents,
                 is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11, ?11)
            "#,
        )
        .bind(imei)
        .bind(request.serial_number.as_deref().and_then(none_if_blank))
        .bind(request.brand.trim())
        .bind(request.model.trim())
        .bind(request.storage.as_deref().and_then(none_if_blank))
        .bind(request.color.as_deref().and_then(none_if_blank))
        .bind(request.condition)
        .bind(InventoryStatus::InStock)
        .bind(request.known_issues.as_deref().and_then(none_if_blank))
        .bind(expected_price.cents())
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn overwrite_for_intake(
        conn: &mut SqliteConnection,
        id: i64,
        request: &CreateInventoryItemRequest,
        imei: &str,
        expected_price: Money,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE inventory_items
            SET imei = ?2, serial_number = ?3, brand = ?4, model = ?5,
                storage = ?6, color = ?7, condition = ?8, status = ?9,
                known_issues = ?10, expected_sale_price_cents = ?11,
                purchase_id = NULL, sale_id = NULL,
                is_active = 1, deleted_at = NULL, updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(imei)
        .bind(request.serial_number.as_deref().and_then(none_if_blank))
        .bind(request.brand.trim())
        .bind(request.model.trim())
        .bind(request.storage.as_deref().and_then(none_if_blank))
        .bind(request.color.as_deref().and_then(none_if_blank))
        .bind(request.condition)
        .bind(InventoryStatus::InStock)
        .bind(request.known_issues.as_deref().and_then(none_if_blank))
        .bind(expected_price.cents())
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

/// Trims and collapses empty strings to None (clearing an optional field).
fn none_if_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Surrogate 15-digit IMEI for intake without a readable IMEI.
///
/// Last 10 digits of the millisecond clock plus 5 digits of subsecond
/// noise; collisions are caught by the active-IMEI unique index anyway.
fn auto_imei(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().rem_euclid(10_000_000_000);
    let tail = (now.timestamp_subsec_nanos() as i64).rem_euclid(100_000);
    format!("{millis:010}{tail:05}")
}

// =============================================================================
// Integration Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use resale_core::{PaymentMethod, PhoneCondition, SaleCustomerRequest};

    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn intake(imei: &str) -> CreateInventoryItemRequest {
        CreateInventoryItemRequest {
            imei: Some(imei.to_string()),
            serial_number: None,
            brand: "Samsung".to_string(),
            model: "Galaxy S22".to_string(),
            storage: Some("256GB".to_string()),
            color: Some("Black".to_string()),
            condition: PhoneCondition::LikeNew,
            known_issues: None,
            expected_sale_price: 450.0,
            purchased: false,
            payment_type: None,
            payment_method: None,
            initial_payment: None,
            customer: None,
        }
    }

    #[tokio::test]
    async fn test_create_item_appends_created_activity() {
        let db = test_db().await;
        let ledger = db.inventory();

        let item = ledger.create_item(intake("356938035643809")).await.unwrap();
        assert_eq!(item.status, InventoryStatus::InStock);
        assert_eq!(item.expected_sale_price_cents, Some(45000));

        let detail = ledger.get_detail(item.id).await.unwrap();
        assert_eq!(detail.activities.len(), 1);
        assert_eq!(detail.activities[0].activity_type, InventoryActivityType::Created);
        assert_eq!(detail.activities[0].from_status, None);
        assert_eq!(detail.activities[0].to_status, InventoryStatus::InStock);
    }

    #[tokio::test]
    async fn test_blank_imei_is_auto_generated() {
        let db = test_db().await;
        let mut request = intake("");
        request.imei = Some("   ".to_string());

        let item = db.inventory().create_item(request).await.unwrap();
        assert_eq!(item.imei.len(), 15);
        assert!(item.imei.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_active_imei_conflict() {
        let db = test_db().await;
        let ledger = db.inventory();

        ledger.create_item(intake("111111111111111")).await.unwrap();
        let err = ledger.create_item(intake("111111111111111")).await.unwrap_err();

        assert!(matches!(err, DbError::Conflict(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_tombstoned_imei_row_is_reused() {
        let db = test_db().await;
        let ledger = db.inventory();

        let first = ledger.create_item(intake("222222222222222")).await.unwrap();
        ledger.delete_item(first.id).await.unwrap();

        let again = ledger.create_item(intake("222222222222222")).await.unwrap();
        // Same physical row, back to life, history still attached
        assert_eq!(again.id, first.id);
        assert!(again.is_active);

        let detail = ledger.get_detail(again.id).await.unwrap();
        let created_rows = detail
            .activities
            .iter()
            .filter(|a| a.activity_type == InventoryActivityType::Created)
            .count();
        assert_eq!(created_rows, 2);
    }

    #[tokio::test]
    async fn test_financed_intake_builds_purchase_aggregate() {
        let db = test_db().await;
        let mut request = intake("333333333333333");
        request.purchased = true;
        request.payment_type = Some(PaymentType::PayLater);
        request.payment_method = Some(PaymentMethod::Cash);
        request.initial_payment = Some(150.0);
        request.customer = Some(SaleCustomerRequest {
            full_name: Some("Sardor".to_string()),
            phone_number: "+998933334455".to_string(),
            address: None,
            passport_id: None,
            notes: None,
        });

        let item = db.inventory().create_item(request).await.unwrap();
        assert!(item.purchase_id.is_some());

        let detail = db.inventory().get_detail(item.id).await.unwrap();
        let kinds: Vec<InventoryActivityType> = detail
            .activities
            .iter()
            .map(|a| a.activity_type)
            .collect();
        assert!(kinds.contains(&InventoryActivityType::Created));
        assert!(kinds.contains(&InventoryActivityType::Purchased));

        // The purchase row carries the split: $150.00 down on $450.00
        let mut conn = db.pool().acquire().await.unwrap();
        let (paid, remaining): (i64, i64) = sqlx::query_as(
            "SELECT paid_now_cents, remaining_cents FROM purchases WHERE id = ?1",
        )
        .bind(item.purchase_id.unwrap())
        .fetch_one(&mut *conn)
        .await
        .unwrap();
        assert_eq!(paid, 15000);
        assert_eq!(remaining, 30000);
    }

    #[tokio::test]
    async fn test_initial_payment_must_not_exceed_price() {
        let db = test_db().await;
        let mut request = intake("444444444444444");
        request.purchased = true;
        request.payment_type = Some(PaymentType::PayLater);
        request.initial_payment = Some(500.0); // price is 450.00

        let err = db.inventory().create_item(request).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::MustNotExceed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_status_changes_follow_transition_table() {
        let db = test_db().await;
        let ledger = db.inventory();
        let item = ledger.create_item(intake("555555555555555")).await.unwrap();

        // IN_STOCK → IN_REPAIR
        ledger
            .update_item(
                item.id,
                UpdateInventoryItemRequest {
                    status: Some(InventoryStatus::InRepair),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        // IN_REPAIR → READY_FOR_SALE
        ledger
            .update_item(
                item.id,
                UpdateInventoryItemRequest {
                    status: Some(InventoryStatus::ReadyForSale),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        // READY_FOR_SALE → RETURNED (generic pair)
        ledger
            .update_item(
                item.id,
                UpdateInventoryItemRequest {
                    status: Some(InventoryStatus::Returned),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let detail = ledger.get_detail(item.id).await.unwrap();
        // Newest first: STATUS_CHANGED, MARKED_DONE, MOVED_TO_REPAIR, CREATED
        let kinds: Vec<InventoryActivityType> = detail
            .activities
            .iter()
            .map(|a| a.activity_type)
            .collect();
        assert_eq!(
            kinds,
            vec![
                InventoryActivityType::StatusChanged,
                InventoryActivityType::MarkedDone,
                InventoryActivityType::MovedToRepair,
                InventoryActivityType::Created,
            ]
        );
        assert_eq!(
            detail.activities[1].notes.as_deref(),
            Some("Inventory status changed to ready for sale")
        );
        assert_eq!(
            detail.activities[2].notes.as_deref(),
            Some("Inventory item moved to repair")
        );
    }

    #[tokio::test]
    async fn test_update_without_status_change_appends_nothing() {
        let db = test_db().await;
        let ledger = db.inventory();
        let item = ledger.create_item(intake("666666666666666")).await.unwrap();

        let updated = ledger
            .update_item(
                item.id,
                UpdateInventoryItemRequest {
                    color: Some("Graphite".to_string()),
                    expected_sale_price: Some(480.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.color.as_deref(), Some("Graphite"));
        assert_eq!(updated.expected_sale_price_cents, Some(48000));

        let detail = ledger.get_detail(item.id).await.unwrap();
        assert_eq!(detail.activities.len(), 1); // only CREATED
    }

    #[tokio::test]
    async fn test_imei_change_collision_is_conflict() {
        let db = test_db().await;
        let ledger = db.inventory();
        ledger.create_item(intake("777777777777777")).await.unwrap();
        let other = ledger.create_item(intake("888888888888888")).await.unwrap();

        let err = ledger
            .update_item(
                other.id,
                UpdateInventoryItemRequest {
                    imei: Some("777777777777777".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_missing_item_is_not_found() {
        let db = test_db().await;
        let err = db
            .inventory()
            .update_item(4242, UpdateInventoryItemRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
