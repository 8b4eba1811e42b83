//! # Sale Transaction Coordinator
//!
//! Orchestrates a sale's whole write path inside ONE database transaction:
//! customer resolution, inventory attachment, worker commission accrual,
//! and both audit trails. Any failure rolls back every side effect.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate request (duplicate refs, money parsing, payment plan)        │
//! │       │                                                                 │
//! │       ▼           ┌── one transaction ─────────────────────────────┐   │
//! │  BEGIN ──────────►│ resolve customer (by id / ensure-by-phone)     │   │
//! │                   │ resolve seller worker (must be active)         │   │
//! │                   │ insert sale header                             │   │
//! │                   │ per item: resolve → attach (SOLD + audit row)  │   │
//! │                   │           → persist/reactivate sale item       │   │
//! │                   │ accrue seller commission counters              │   │
//! │                   │ append the ONE initial payment activity        │   │
//! │  COMMIT ◄─────────┴────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Update Flow
//! Reconciles the item set (attach added, detach removed — detaching
//! writes no audit row), recomputes the payment plan, persists it, then
//! runs the collapse-to-first-payment step, which independently re-derives
//! paid_now/remaining/payment_type from the single retained payment
//! activity. The two computations can disagree after repeated edits;
//! that divergence is preserved behavior.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use resale_core::{
    CoreError, CreateSaleRequest, Money, PaymentPlan, PaymentTerms, Precision, Sale, SaleDetail,
    SaleItemRequest, UpdateSaleCustomerRequest, UpdateSaleRequest, ValidationError,
};

use crate::error::DbResult;
use crate::repository::activity::SaleActivityLog;
use crate::repository::customer::CustomerDirectory;
use crate::repository::inventory::InventoryLedger;
use crate::repository::sale::{SaleHeader, SaleStore};
use crate::repository::worker::WorkerLedger;

/// Transactional create/update of sales.
#[derive(Debug, Clone)]
pub struct SaleCoordinator {
    pool: SqlitePool,
}

impl SaleCoordinator {
    pub fn new(pool: SqlitePool) -> Self {
        SaleCoordinator { pool }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Creates a sale with its items, commission accrual, and initial
    /// payment activity, all-or-nothing.
    pub async fn create(&self, request: CreateSaleRequest) -> DbResult<SaleDetail> {
        if request.items.is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "items".to_string(),
            })
            .into());
        }
        ensure_no_duplicate_item_refs(&request.items)?;

        // Money leaves f64 exactly once, here.
        let mut total_price = Money::zero();
        let mut prices = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let price = Money::parse_numeric(item.sale_price, "sale_price")?
                .ensure_fits_precision("sale_price", Precision::Standard)?;
            prices.push(price);
            total_price += price;
        }
        total_price.ensure_fits_precision("total_price", Precision::Standard)?;

        let explicit_paid_now = match request.paid_now {
            Some(raw) => Some(
                Money::parse_numeric(raw, "paid_now")?
                    .ensure_fits_precision("paid_now", Precision::Standard)?,
            ),
            None => None,
        };
        let plan = PaymentPlan::for_create(
            total_price,
            &PaymentTerms {
                payment_type: request.payment_type,
                installment_months: request.installment_months,
                first_payment_now: request.first_payment_now,
                paid_now: explicit_paid_now,
            },
        )?;

        let profit = match request.profit {
            Some(raw) => Some(
                Money::parse_numeric(raw, "profit")?
                    .ensure_fits_precision("profit", Precision::Standard)?,
            ),
            None => None,
        };

        let now = Utc::now();
        let sold_at = request.sold_at.unwrap_or(now);

        let mut tx = self.pool.begin().await?;

        let customer_id = match (request.customer_id, &request.customer) {
            (Some(id), _) => Some(CustomerDirectory::get_active(&mut tx, id).await?.id),
            (None, Some(customer)) => Some(CustomerDirectory::ensure(&mut tx, customer, now).await?.id),
            (None, None) => None,
        };

        let seller = match request.seller_worker_id {
            Some(worker_id) => Some(
                WorkerLedger::find_active(&mut tx, worker_id)
                    .await?
                    .ok_or(CoreError::InvalidWorkerRef { worker_id })?,
            ),
            None => None,
        };

        let sale_id = SaleStore::insert(
            &mut tx,
            &SaleHeader {
                sold_at,
                customer_id,
                seller_worker_id: seller.as_ref().map(|w| w.id),
                payment_method: request.payment_method,
                payment_type: request.payment_type,
                plan: plan.clone(),
                profit,
                notes: request.notes.clone(),
            },
            now,
        )
        .await?;

        for (item_request, price) in request.items.iter().zip(prices.iter()) {
            let inventory = InventoryLedger::find_active_by_id_or_imei(
                &mut tx,
                item_request.item_id,
                item_request.imei.as_deref(),
            )
            .await?;

            InventoryLedger::attach_to_sale(&mut tx, &inventory, sale_id, *price, now).await?;
            SaleStore::upsert_item(
                &mut tx,
                sale_id,
                inventory.id,
                *price,
                item_request.notes.as_deref(),
                now,
            )
            .await?;
        }

        if let Some(worker) = &seller {
            WorkerLedger::accrue_on_sale(
                &mut tx,
                worker,
                request.items.len() as i64,
                total_price,
                profit.unwrap_or(Money::zero()),
                now,
            )
            .await?;
        }

        // Exactly one activity describes the initial payment
        let note = initial_payment_note(&plan);
        SaleActivityLog::append(&mut tx, sale_id, sold_at, plan.paid_now, Some(&note), now)
            .await?;

        tx.commit().await?;
        info!(sale_id, total_cents = total_price.cents(), "Sale created");

        self.get_detail(sale_id).await
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Updates a sale: reconciles its item set when one is supplied,
    /// recomputes the payment plan, then collapses the payment history to
    /// its earliest activity.
    pub async fn update(&self, id: i64, request: UpdateSaleRequest) -> DbResult<SaleDetail> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let sale = SaleStore::get_active(&mut tx, id).await?;

        let total_price = match request.items.as_deref() {
            Some(items) if !items.is_empty() => {
                self.apply_items_update(&mut tx, &sale, items, now).await?
            }
            _ => Money::from_cents(SaleStore::sum_active_items(&mut tx, sale.id).await?),
        };
        total_price.ensure_fits_precision("total_price", Precision::Standard)?;

        let payment_type = request.payment_type.unwrap_or(sale.payment_type);
        let plan = PaymentPlan::for_update(
            total_price,
            &PaymentTerms {
                payment_type,
                installment_months: request.installment_months.or(sale.installment_months),
                first_payment_now: request.first_payment_now.or(sale.first_payment_now),
                paid_now: None,
            },
        )?;

        let customer_id = resolve_customer_for_update(
            &mut tx,
            sale.customer_id,
            request.customer_id,
            request.customer.as_ref(),
            now,
        )
        .await?;

        SaleStore::update_header(
            &mut tx,
            sale.id,
            &SaleHeader {
                sold_at: request.sold_at.unwrap_or(sale.sold_at),
                customer_id,
                seller_worker_id: sale.seller_worker_id,
                payment_method: request.payment_method.unwrap_or(sale.payment_method),
                payment_type,
                plan,
                profit: sale.profit_cents.map(Money::from_cents),
                notes: request.notes.clone().or_else(|| sale.notes.clone()),
            },
            now,
        )
        .await?;

        // Second, independent derivation of the money state — intentional
        collapse_to_first_payment(&mut tx, sale.id, total_price, now).await?;

        tx.commit().await?;
        debug!(sale_id = sale.id, "Sale updated");

        self.get_detail(id).await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Sale with its active items and payment history (newest first).
    pub async fn get_detail(&self, id: i64) -> DbResult<SaleDetail> {
        let mut conn = self.pool.acquire().await?;
        let sale = SaleStore::get_active(&mut conn, id).await?;
        let items = SaleStore::active_items(&mut conn, id).await?;
        let activities = SaleActivityLog::latest(&mut conn, id).await?;
        Ok(SaleDetail {
            sale,
            items,
            activities,
        })
    }

    // =========================================================================
    // Item reconciliation
    // =========================================================================

    /// Reconciles the sale's active items against the requested set.
    /// Returns the new total price.
    async fn apply_items_update(
        &self,
        conn: &mut SqliteConnection,
        sale: &Sale,
        items: &[SaleItemRequest],
        now: DateTime<Utc>,
    ) -> DbResult<Money> {
        ensure_no_duplicate_item_refs(items)?;

        let existing = SaleStore::active_items(&mut *conn, sale.id).await?;
        let existing_by_item: HashMap<i64, i64> = existing
            .iter()
            .map(|entry| (entry.item_id, entry.id))
            .collect();

        let mut target_item_ids: HashSet<i64> = HashSet::with_capacity(items.len());
        let mut total_price = Money::zero();

        for item_request in items {
            let price = Money::parse_numeric(item_request.sale_price, "sale_price")?
                .ensure_fits_precision("sale_price", Precision::Standard)?;

            let inventory = InventoryLedger::find_active_by_id_or_imei(
                &mut *conn,
                item_request.item_id,
                item_request.imei.as_deref(),
            )
            .await?;
            target_item_ids.insert(inventory.id);

            match existing_by_item.get(&inventory.id) {
                // Already in the sale: refresh price/notes, leave status be
                Some(sale_item_id) => {
                    SaleStore::update_item_row(
                        &mut *conn,
                        *sale_item_id,
                        price,
                        item_request.notes.as_deref(),
                        now,
                    )
                    .await?;
                }
                // Newly added: full attach, audit row included
                None => {
                    InventoryLedger::attach_to_sale(&mut *conn, &inventory, sale.id, price, now)
                        .await?;
                    SaleStore::upsert_item(
                        &mut *conn,
                        sale.id,
                        inventory.id,
                        price,
                        item_request.notes.as_deref(),
                        now,
                    )
                    .await?;
                }
            }

            total_price += price;
            total_price.ensure_fits_precision("total_price", Precision::Standard)?;
        }

        // Dropped items leave the sale silently: SOLD reverts to IN_STOCK
        // with NO audit row (preserved asymmetry)
        for entry in &existing {
            if target_item_ids.contains(&entry.item_id) {
                continue;
            }
            SaleStore::deactivate_item(&mut *conn, entry.id, now).await?;
            InventoryLedger::detach_from_sale(&mut *conn, entry.item_id, now).await?;
        }

        Ok(total_price)
    }
}

// =============================================================================
// Free helpers
// =============================================================================

/// Rejects requests that reference the same device twice, by id or IMEI.
fn ensure_no_duplicate_item_refs(items: &[SaleItemRequest]) -> DbResult<()> {
    let mut seen_ids: HashSet<i64> = HashSet::new();
    let mut seen_imeis: HashSet<String> = HashSet::new();

    for item in items {
        if let Some(item_id) = item.item_id {
            if !seen_ids.insert(item_id) {
                return Err(CoreError::DuplicateItemRef {
                    reference: format!("item_id {item_id}"),
                }
                .into());
            }
        }

        if let Some(imei) = item.imei.as_deref() {
            let normalized = imei.trim();
            if !normalized.is_empty() && !seen_imeis.insert(normalized.to_string()) {
                return Err(CoreError::DuplicateItemRef {
                    reference: format!("IMEI {normalized}"),
                }
                .into());
            }
        }
    }

    Ok(())
}

/// The note on the single initial payment activity.
fn initial_payment_note(plan: &PaymentPlan) -> String {
    match (plan.installment_months, plan.first_payment_now) {
        (None, _) => "Full payment".to_string(),
        (Some(months), Some(true)) => {
            let monthly = plan.monthly_installment.unwrap_or(Money::zero());
            format!(
                "First month payment: {}; Remaining: {}; Installment: {} x {}",
                plan.paid_now, plan.remaining, months, monthly
            )
        }
        (Some(months), _) => {
            let monthly = plan.monthly_installment.unwrap_or(Money::zero());
            format!(
                "Installment plan: {} x {}; Remaining: {}",
                months, monthly, plan.remaining
            )
        }
    }
}

/// Keeps only the earliest payment activity (by paid_at, then id),
/// soft-deletes the rest, and re-derives the sale's money state from the
/// retained amount.
async fn collapse_to_first_payment(
    conn: &mut SqliteConnection,
    sale_id: i64,
    total_price: Money,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let activities = SaleActivityLog::active_in_payment_order(&mut *conn, sale_id).await?;
    if activities.len() <= 1 {
        return Ok(());
    }

    let first = &activities[0];
    for activity in &activities[1..] {
        SaleActivityLog::deactivate(&mut *conn, activity.id, now).await?;
    }

    let (paid_now, remaining, payment_type) =
        PaymentPlan::collapse_to_first_payment(total_price, first.amount());

    debug!(
        sale_id,
        retained_activity = first.id,
        paid_cents = paid_now.cents(),
        "Collapsed payment history to first payment"
    );

    SaleStore::update_money_state(&mut *conn, sale_id, paid_now, remaining, payment_type, now).await
}

/// Resolves the customer reference for an update request.
///
/// An explicit customer_id must point at an active customer; an inline
/// payload needs name+phone together and refreshes (or creates) the
/// record it lands on.
async fn resolve_customer_for_update(
    conn: &mut SqliteConnection,
    current_customer_id: Option<i64>,
    next_customer_id: Option<i64>,
    payload: Option<&UpdateSaleCustomerRequest>,
    now: DateTime<Utc>,
) -> DbResult<Option<i64>> {
    let mut customer = match (next_customer_id, current_customer_id) {
        (Some(id), _) => Some(CustomerDirectory::get_active(&mut *conn, id).await?),
        (None, Some(id)) => CustomerDirectory::find_active_by_id(&mut *conn, id).await?,
        (None, None) => None,
    };

    let Some(payload) = payload else {
        return Ok(customer.map(|c| c.id));
    };

    let full_name = payload
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let phone_number = payload
        .phone_number
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let (full_name, phone_number) = match (full_name, phone_number) {
        (Some(name), Some(phone)) => (name, phone),
        (None, None) => return Ok(customer.map(|c| c.id)),
        _ => {
            return Err(CoreError::from(ValidationError::ProvideTogether {
                first: "customer.full_name".to_string(),
                second: "customer.phone_number".to_string(),
            })
            .into());
        }
    };

    if customer.is_none() {
        customer = CustomerDirectory::find_active_by_phone(&mut *conn, phone_number).await?;
    }

    let address = payload
        .address
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match customer {
        Some(existing) => {
            CustomerDirectory::update_contact(
                &mut *conn,
                existing.id,
                full_name,
                phone_number,
                address,
                now,
            )
            .await?;
            Ok(Some(existing.id))
        }
        None => {
            let id = CustomerDirectory::create(
                &mut *conn,
                full_name,
                phone_number,
                address,
                None,
                None,
                now,
            )
            .await?;
            Ok(Some(id))
        }
    }
}

// =============================================================================
// Integration Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use resale_core::{
        CreateInventoryItemRequest, CreateWorkerRequest, InventoryActivityType, InventoryStatus,
        PaymentMethod, PaymentType, PhoneCondition, SalaryType, SaleCustomerRequest,
    };

    use crate::pool::{Database, DbConfig};
    use crate::repository::activity::InventoryActivityLog;

    async fn test_db() -> Database {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn intake(imei: &str, price: f64) -> CreateInventoryItemRequest {
        CreateInventoryItemRequest {
            imei: Some(imei.to_string()),
            serial_number: None,
            brand: "Apple".to_string(),
            model: "iPhone 13".to_string(),
            storage: Some("128GB".to_string()),
            color: None,
            condition: PhoneCondition::Good,
            known_issues: None,
            expected_sale_price: price,
            purchased: false,
            payment_type: None,
            payment_method: None,
            initial_payment: None,
            customer: None,
        }
    }

    fn line(item_id: i64, price: f64) -> SaleItemRequest {
        SaleItemRequest {
            item_id: Some(item_id),
            imei: None,
            sale_price: price,
            notes: None,
        }
    }

    fn sale_request(items: Vec<SaleItemRequest>, payment_type: PaymentType) -> CreateSaleRequest {
        CreateSaleRequest {
            sold_at: None,
            customer_id: None,
            seller_worker_id: None,
            customer: None,
            payment_method: PaymentMethod::Cash,
            payment_type,
            paid_now: None,
            installment_months: None,
            first_payment_now: None,
            profit: None,
            notes: None,
            items,
        }
    }

    #[tokio::test]
    async fn test_create_paid_now_sale() {
        let db = test_db().await;
        let inventory = db.inventory();

        let a = inventory.create_item(intake("100000000000001", 150.0)).await.unwrap();
        let b = inventory.create_item(intake("100000000000002", 150.0)).await.unwrap();
        let c = inventory.create_item(intake("100000000000003", 200.0)).await.unwrap();

        let detail = db
            .sales()
            .create(sale_request(
                vec![line(a.id, 150.0), line(b.id, 150.0), line(c.id, 200.0)],
                PaymentType::PaidNow,
            ))
            .await
            .unwrap();

        assert_eq!(detail.sale.total_price_cents, 50000);
        assert_eq!(detail.sale.paid_now_cents, 50000);
        assert_eq!(detail.sale.remaining_cents, 0);
        assert_eq!(detail.sale.installment_months, None);
        assert_eq!(detail.items.len(), 3);

        // Active sale items sum to the sale total, to the cent
        let item_sum: i64 = detail.items.iter().map(|i| i.sale_price_cents).sum();
        assert_eq!(item_sum, detail.sale.total_price_cents);

        // Exactly one payment activity, describing the full payment
        assert_eq!(detail.activities.len(), 1);
        assert_eq!(detail.activities[0].amount_cents, 50000);
        assert_eq!(detail.activities[0].notes.as_deref(), Some("Full payment"));

        // Each device flipped to SOLD with the sale linked
        for item in [&a, &b, &c] {
            let fresh = inventory.get_detail(item.id).await.unwrap();
            assert_eq!(fresh.item.status, InventoryStatus::Sold);
            assert_eq!(fresh.item.sale_id, Some(detail.sale.id));
            // CREATED + SOLD
            assert_eq!(fresh.activities.len(), 2);
            let sold = &fresh.activities[0];
            assert_eq!(sold.activity_type, InventoryActivityType::Sold);
            assert_eq!(sold.from_status, Some(InventoryStatus::InStock));
            assert_eq!(sold.to_status, InventoryStatus::Sold);
        }
    }

    #[tokio::test]
    async fn test_create_installment_sale() {
        let db = test_db().await;
        let item = db
            .inventory()
            .create_item(intake("200000000000001", 600.0))
            .await
            .unwrap();

        let mut request = sale_request(vec![line(item.id, 600.0)], PaymentType::PayLater);
        request.installment_months = Some(6);
        request.first_payment_now = Some(true);

        let detail = db.sales().create(request).await.unwrap();

        assert_eq!(detail.sale.total_price_cents, 60000);
        assert_eq!(detail.sale.monthly_installment_cents, Some(10000));
        assert_eq!(detail.sale.paid_now_cents, 10000);
        assert_eq!(detail.sale.remaining_cents, 50000);
        assert_eq!(detail.sale.installment_months, Some(6));
        assert_eq!(detail.sale.first_payment_now, Some(true));

        assert_eq!(detail.activities.len(), 1);
        let note = detail.activities[0].notes.as_deref().unwrap();
        assert!(note.contains("First month payment: $100.00"), "note: {note}");
        assert!(note.contains("6 x $100.00"), "note: {note}");
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_item_refs() {
        let db = test_db().await;
        let item = db
            .inventory()
            .create_item(intake("300000000000001", 100.0))
            .await
            .unwrap();

        let err = db
            .sales()
            .create(sale_request(
                vec![line(item.id, 100.0), line(item.id, 100.0)],
                PaymentType::PaidNow,
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            crate::error::DbError::Domain(CoreError::DuplicateItemRef { .. })
        ));
    }

    #[tokio::test]
    async fn test_cannot_sell_same_item_twice() {
        let db = test_db().await;
        let item = db
            .inventory()
            .create_item(intake("400000000000001", 100.0))
            .await
            .unwrap();

        db.sales()
            .create(sale_request(vec![line(item.id, 100.0)], PaymentType::PaidNow))
            .await
            .unwrap();

        let err = db
            .sales()
            .create(sale_request(vec![line(item.id, 100.0)], PaymentType::PaidNow))
            .await
            .unwrap_err();

        assert!(
            matches!(err, crate::error::DbError::Conflict(_)),
            "expected Conflict, got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_seller_accrual_and_payout_reset() {
        let db = test_db().await;
        let worker = db
            .workers()
            .create(CreateWorkerRequest {
                full_name: "Aziz".to_string(),
                phone_number: None,
                address: None,
                salary_type: SalaryType::Percent,
                monthly_salary: None,
                salary_percent: Some(10.0),
                notes: None,
            })
            .await
            .unwrap();
        let item = db
            .inventory()
            .create_item(intake("500000000000001", 1500.0))
            .await
            .unwrap();

        let mut request = sale_request(vec![line(item.id, 1500.0)], PaymentType::PaidNow);
        request.seller_worker_id = Some(worker.id);
        request.profit = Some(1000.0);

        db.sales().create(request).await.unwrap();

        let accrued = db.workers().get_active_by_id(worker.id).await.unwrap();
        assert_eq!(accrued.sold_phones_count, 1);
        assert_eq!(accrued.total_sold_cents, 150000);
        assert_eq!(accrued.total_profit_cents, 100000);
        // 10% of $1000.00 profit
        assert_eq!(accrued.percent_salary_accrued_cents, 10000);

        // Paying out the full accrued balance resets the cycle counters
        db.workers()
            .pay(
                worker.id,
                resale_core::PaySalaryRequest {
                    month: "2026-08".to_string(),
                    amount_paid: 100.0,
                    paid_at: None,
                    notes: None,
                },
            )
            .await
            .unwrap();

        let paid = db.workers().get_active_by_id(worker.id).await.unwrap();
        assert_eq!(paid.percent_salary_accrued_cents, 0);
        assert_eq!(paid.sold_phones_count, 0);
        assert_eq!(paid.total_profit_cents, 0);
        // Lifetime sold amount is not part of the cycle
        assert_eq!(paid.total_sold_cents, 150000);
    }

    #[tokio::test]
    async fn test_unknown_seller_is_rejected() {
        let db = test_db().await;
        let item = db
            .inventory()
            .create_item(intake("600000000000001", 100.0))
            .await
            .unwrap();

        let mut request = sale_request(vec![line(item.id, 100.0)], PaymentType::PaidNow);
        request.seller_worker_id = Some(999);

        let err = db.sales().create(request).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::DbError::Domain(CoreError::InvalidWorkerRef { worker_id: 999 })
        ));
    }

    #[tokio::test]
    async fn test_update_drops_item_silently() {
        let db = test_db().await;
        let inventory = db.inventory();
        let keep = inventory.create_item(intake("700000000000001", 300.0)).await.unwrap();
        let removed = inventory.create_item(intake("700000000000002", 200.0)).await.unwrap();

        let detail = db
            .sales()
            .create(sale_request(
                vec![line(keep.id, 300.0), line(removed.id, 200.0)],
                PaymentType::PaidNow,
            ))
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let before = InventoryActivityLog::count_all(&mut conn, removed.id).await.unwrap();
        // In-memory SQLite runs on a single pooled connection; hand it back
        // before the coordinator needs it
        drop(conn);

        let updated = db
            .sales()
            .update(
                detail.sale.id,
                UpdateSaleRequest {
                    items: Some(vec![line(keep.id, 300.0)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.sale.total_price_cents, 30000);

        // The dropped device is back in stock with the sale link cleared…
        let dropped = inventory.get_detail(removed.id).await.unwrap();
        assert_eq!(dropped.item.status, InventoryStatus::InStock);
        assert_eq!(dropped.item.sale_id, None);

        // …and NO audit row was appended for the detach (documented asymmetry)
        let mut conn = db.pool().acquire().await.unwrap();
        let after = InventoryActivityLog::count_all(&mut conn, removed.id).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_update_adds_item_with_audit_row() {
        let db = test_db().await;
        let inventory = db.inventory();
        let first = inventory.create_item(intake("800000000000001", 300.0)).await.unwrap();
        let added = inventory.create_item(intake("800000000000002", 250.0)).await.unwrap();

        let detail = db
            .sales()
            .create(sale_request(vec![line(first.id, 300.0)], PaymentType::PaidNow))
            .await
            .unwrap();

        let updated = db
            .sales()
            .update(
                detail.sale.id,
                UpdateSaleRequest {
                    items: Some(vec![line(first.id, 300.0), line(added.id, 250.0)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.items.len(), 2);
        assert_eq!(updated.sale.total_price_cents, 55000);

        let attached = inventory.get_detail(added.id).await.unwrap();
        assert_eq!(attached.item.status, InventoryStatus::Sold);
        assert_eq!(
            attached.activities[0].activity_type,
            InventoryActivityType::Sold
        );
    }

    #[tokio::test]
    async fn test_sale_item_row_is_reactivated_not_duplicated() {
        let db = test_db().await;
        let inventory = db.inventory();
        let keep = inventory.create_item(intake("900000000000001", 300.0)).await.unwrap();
        let bounced = inventory.create_item(intake("900000000000002", 200.0)).await.unwrap();

        let detail = db
            .sales()
            .create(sale_request(
                vec![line(keep.id, 300.0), line(bounced.id, 200.0)],
                PaymentType::PaidNow,
            ))
            .await
            .unwrap();

        // Drop the device, then re-add it
        db.sales()
            .update(
                detail.sale.id,
                UpdateSaleRequest {
                    items: Some(vec![line(keep.id, 300.0)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        db.sales()
            .update(
                detail.sale.id,
                UpdateSaleRequest {
                    items: Some(vec![line(keep.id, 300.0), line(bounced.id, 200.0)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // One physical row for the device across the whole round trip
        let mut conn = db.pool().acquire().await.unwrap();
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items WHERE item_id = ?1")
            .bind(bounced.id)
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(rows, 1);

        // Return the borrowed connection to the single-connection in-memory
        // pool before issuing another pooled query, or the pool deadlocks.
        drop(conn);

        let fresh = inventory.get_detail(bounced.id).await.unwrap();
        assert_eq!(fresh.item.status, InventoryStatus::Sold);
    }

    #[tokio::test]
    async fn test_collapse_keeps_earliest_payment() {
        let db = test_db().await;
        let item = db
            .inventory()
            .create_item(intake("110000000000001", 600.0))
            .await
            .unwrap();

        let mut request = sale_request(vec![line(item.id, 600.0)], PaymentType::PayLater);
        request.installment_months = Some(6);
        request.first_payment_now = Some(true);
        let detail = db.sales().create(request).await.unwrap();

        // A later correction recorded an earlier down payment of $250.00
        let earlier = detail.sale.sold_at - Duration::days(1);
        let mut conn = db.pool().acquire().await.unwrap();
        SaleActivityLog::append(
            &mut conn,
            detail.sale.id,
            earlier,
            Money::from_cents(25000),
            Some("Down payment"),
            Utc::now(),
        )
        .await
        .unwrap();
        drop(conn);

        let updated = db
            .sales()
            .update(detail.sale.id, UpdateSaleRequest::default())
            .await
            .unwrap();

        // Only the earliest activity survives, and the money state is
        // re-derived from ITS amount — not from the plan recompute
        assert_eq!(updated.activities.len(), 1);
        assert_eq!(updated.activities[0].amount_cents, 25000);
        assert_eq!(updated.sale.paid_now_cents, 25000);
        assert_eq!(updated.sale.remaining_cents, 35000);
        assert_eq!(updated.sale.payment_type, PaymentType::PayLater);
        // The plan fields persisted before the collapse still describe the
        // 6-month installment shape (intentional divergence)
        assert_eq!(updated.sale.monthly_installment_cents, Some(10000));
    }

    #[tokio::test]
    async fn test_customer_resolved_by_phone_across_sales() {
        let db = test_db().await;
        let inventory = db.inventory();
        let a = inventory.create_item(intake("120000000000001", 100.0)).await.unwrap();
        let b = inventory.create_item(intake("120000000000002", 100.0)).await.unwrap();

        let customer = SaleCustomerRequest {
            full_name: Some("Dilshod".to_string()),
            phone_number: "+998901112233".to_string(),
            address: None,
            passport_id: None,
            notes: None,
        };

        let mut first = sale_request(vec![line(a.id, 100.0)], PaymentType::PaidNow);
        first.customer = Some(customer.clone());
        let first = db.sales().create(first).await.unwrap();

        let mut second = sale_request(vec![line(b.id, 100.0)], PaymentType::PaidNow);
        second.customer = Some(customer);
        let second = db.sales().create(second).await.unwrap();

        assert!(first.sale.customer_id.is_some());
        assert_eq!(first.sale.customer_id, second.sale.customer_id);
    }
}
