//! # Worker Commission Ledger
//!
//! Salary/commission accrual and payout.
//!
//! ## Accrual Cycle (PERCENT workers)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sale with seller ──► sold_phones_count += items                       │
//! │                       total_sold        += sale total                  │
//! │                       total_profit      += sale profit                 │
//! │                       accrued += round(profit × percent / 100)         │
//! │                                                                        │
//! │  payout ──► accrued = max(0, accrued − amount)                         │
//! │             accrued hits 0? ──► sold_phones_count = 0                  │
//! │                                 total_profit      = 0                  │
//! │             (a full payout closes and restarts the accrual cycle)      │
//! │                                                                        │
//! │  MONTHLY workers: payouts are recorded but nothing is decremented —    │
//! │  "remaining" is derived at read time from this month's payments.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use resale_core::validation::{normalize_month, normalize_optional_phone};
use resale_core::{
    CreateWorkerRequest, Money, PaySalaryRequest, Precision, SalaryType,
    UpdateWorkerSalaryRequest, ValidationError, Worker, WorkerSalaryPayment,
};

use crate::error::{DbError, DbResult};

const WORKER_COLUMNS: &str = r#"
    id, full_name, phone_number, address, salary_type, monthly_salary_cents,
    salary_percent_bps, sold_phones_count, total_sold_cents, total_profit_cents,
    percent_salary_accrued_cents, notes, is_active, created_at, updated_at, deleted_at
"#;

const PAYMENT_COLUMNS: &str = r#"
    id, worker_id, month, amount_paid_cents, paid_at, notes,
    is_active, created_at, updated_at, deleted_at
"#;

/// Worker salary/commission operations.
#[derive(Debug, Clone)]
pub struct WorkerLedger {
    pool: SqlitePool,
}

impl WorkerLedger {
    pub fn new(pool: SqlitePool) -> Self {
        WorkerLedger { pool }
    }

    // =========================================================================
    // Worker management
    // =========================================================================

    /// Creates a worker, validating the salary shape.
    pub async fn create(&self, request: CreateWorkerRequest) -> DbResult<Worker> {
        let now = Utc::now();

        let (monthly_salary, salary_percent_bps) = salary_shape(
            request.salary_type,
            request.monthly_salary,
            request.salary_percent,
            true,
        )?;

        let phone_number = normalize_optional_phone(request.phone_number.as_deref());

        let mut tx = self.pool.begin().await?;

        if let Some(phone) = phone_number.as_deref() {
            let taken: Option<i64> = sqlx::query_scalar(
                "SELECT id FROM workers WHERE phone_number = ?1 AND is_active = 1",
            )
            .bind(phone)
            .fetch_optional(&mut *tx)
            .await?;
            if taken.is_some() {
                return Err(DbError::conflict("Worker phone_number already exists"));
            }
        }

        let result = sqlx::query(
            r#"
            INSERT INTO workers
                (full_name, phone_number, address, salary_type, monthly_salary_cents,
                 salary_percent_bps, notes, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)
            "#,
        )
        .bind(request.full_name.trim())
        .bind(&phone_number)
        .bind(request.address.as_deref().map(str::trim))
        .bind(request.salary_type)
        .bind(monthly_salary.cents())
        .bind(salary_percent_bps)
        .bind(request.notes.as_deref())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let worker_id = result.last_insert_rowid();
        tx.commit().await?;

        self.get_active_by_id(worker_id).await
    }

    /// Changes a worker's salary shape; switching type zeroes the other
    /// field.
    pub async fn update_salary(
        &self,
        worker_id: i64,
        request: UpdateWorkerSalaryRequest,
    ) -> DbResult<Worker> {
        let now = Utc::now();

        let (monthly_salary, salary_percent_bps) = salary_shape(
            request.salary_type,
            request.monthly_salary,
            request.salary_percent,
            false,
        )?;

        let mut tx = self.pool.begin().await?;
        // Existence check keeps NotFound ahead of a silent zero-row update
        Self::find_active(&mut tx, worker_id)
            .await?
            .ok_or_else(|| DbError::not_found("Worker", worker_id))?;

        sqlx::query(
            r#"
            UPDATE workers
            SET salary_type = ?2, monthly_salary_cents = ?3, salary_percent_bps = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(worker_id)
        .bind(request.salary_type)
        .bind(monthly_salary.cents())
        .bind(salary_percent_bps)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_active_by_id(worker_id).await
    }

    /// Active worker by id or `NotFound`.
    pub async fn get_active_by_id(&self, id: i64) -> DbResult<Worker> {
        let mut conn = self.pool.acquire().await?;
        Self::find_active(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Worker", id))
    }

    // =========================================================================
    // Payout
    // =========================================================================

    /// Records a salary payment.
    ///
    /// PERCENT workers: the accrued balance is decremented (floored at
    /// zero); a balance hitting zero resets the sold-count and profit
    /// counters, closing the accrual cycle. MONTHLY workers are never
    /// auto-decremented by this operation.
    pub async fn pay(
        &self,
        worker_id: i64,
        request: PaySalaryRequest,
    ) -> DbResult<WorkerSalaryPayment> {
        let now = Utc::now();
        let month = normalize_month(&request.month)?;
        let amount_paid = Money::parse_numeric(request.amount_paid, "amount_paid")?
            .ensure_fits_precision("amount_paid", Precision::Standard)?;
        let paid_at = request.paid_at.unwrap_or(now);

        let mut tx = self.pool.begin().await?;

        let worker = Self::find_active(&mut tx, worker_id)
            .await?
            .ok_or_else(|| DbError::not_found("Worker", worker_id))?;

        let result = sqlx::query(
            r#"
            INSERT INTO worker_salary_payments
                (worker_id, month, amount_paid_cents, paid_at, notes,
                 is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
            "#,
        )
        .bind(worker_id)
        .bind(&month)
        .bind(amount_paid.cents())
        .bind(paid_at)
        .bind(request.notes.as_deref().map(str::trim))
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let payment_id = result.last_insert_rowid();

        if worker.salary_type == SalaryType::Percent {
            let next_accrued =
                (worker.percent_salary_accrued() - amount_paid).max(Money::zero());

            debug!(
                worker_id,
                accrued = next_accrued.cents(),
                "Percent salary drawn down"
            );

            if next_accrued.is_zero() {
                // Full payout closes and restarts the accrual cycle
                sqlx::query(
                    r#"
                    UPDATE workers
                    SET percent_salary_accrued_cents = 0, sold_phones_count = 0,
                        total_profit_cents = 0, updated_at = ?2
                    WHERE id = ?1
                    "#,
                )
                .bind(worker_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            } else {
                sqlx::query(
                    r#"
                    UPDATE workers
                    SET percent_salary_accrued_cents = ?2, updated_at = ?3
                    WHERE id = ?1
                    "#,
                )
                .bind(worker_id)
                .bind(next_accrued.cents())
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        let mut conn = self.pool.acquire().await?;
        let payment = sqlx::query_as::<_, WorkerSalaryPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM worker_salary_payments WHERE id = ?1"
        ))
        .bind(payment_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(payment)
    }

    /// Point-in-time remaining salary of a MONTHLY worker for a month:
    /// `monthly_salary − Σ payments recorded for that month`. Derived,
    /// never stored.
    pub async fn monthly_remaining(&self, worker_id: i64, month: &str) -> DbResult<Money> {
        let month = normalize_month(month)?;
        let worker = self.get_active_by_id(worker_id).await?;

        let mut conn = self.pool.acquire().await?;
        let paid: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_paid_cents), 0) FROM worker_salary_payments
             WHERE worker_id = ?1 AND month = ?2 AND is_active = 1",
        )
        .bind(worker_id)
        .bind(&month)
        .fetch_one(&mut *conn)
        .await?;

        Ok(worker.monthly_salary() - Money::from_cents(paid))
    }

    /// Payout history, newest first.
    pub async fn payments(&self, worker_id: i64) -> DbResult<Vec<WorkerSalaryPayment>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, WorkerSalaryPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM worker_salary_payments
             WHERE worker_id = ?1 AND is_active = 1
             ORDER BY paid_at DESC, id DESC"
        ))
        .bind(worker_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    // =========================================================================
    // In-transaction operations
    // =========================================================================

    /// Active worker by id, if any.
    pub async fn find_active(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> DbResult<Option<Worker>> {
        let row = sqlx::query_as::<_, Worker>(&format!(
            "SELECT {WORKER_COLUMNS} FROM workers WHERE id = ?1 AND is_active = 1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row)
    }

    /// Accrues one sale onto the seller's counters.
    ///
    /// PERCENT workers additionally accrue
    /// `commission = profit × percent / 100`, rounded half-up to the cent.
    pub async fn accrue_on_sale(
        conn: &mut SqliteConnection,
        worker: &Worker,
        items_sold: i64,
        sale_total: Money,
        sale_profit: Money,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let sold_phones_count = worker.sold_phones_count + items_sold;
        let total_sold = (Money::from_cents(worker.total_sold_cents) + sale_total)
            .ensure_fits_precision("total_sold", Precision::Wide)?;
        let total_profit = (Money::from_cents(worker.total_profit_cents) + sale_profit)
            .ensure_fits_precision("total_profit", Precision::Wide)?;

        let accrued = if worker.salary_type == SalaryType::Percent {
            let commission = sale_profit.percent_of(worker.salary_percent_bps.unwrap_or(0));
            (worker.percent_salary_accrued() + commission)
                .ensure_fits_precision("percent_salary_accrued", Precision::Wide)?
        } else {
            worker.percent_salary_accrued()
        };

        debug!(
            worker_id = worker.id,
            items_sold,
            accrued = accrued.cents(),
            "Accruing sale onto worker counters"
        );

        sqlx::query(
            r#"
            UPDATE workers
            SET sold_phones_count = ?2, total_sold_cents = ?3, total_profit_cents = ?4,
                percent_salary_accrued_cents = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(worker.id)
        .bind(sold_phones_count)
        .bind(total_sold.cents())
        .bind(total_profit.cents())
        .bind(accrued.cents())
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

/// Validates and converts the salary fields for a worker's salary type.
///
/// `require_positive` applies the create-path rule that the relevant
/// field must be present and > 0.
fn salary_shape(
    salary_type: SalaryType,
    monthly_salary: Option<f64>,
    salary_percent: Option<f64>,
    require_positive: bool,
) -> resale_core::CoreResult<(Money, Option<i64>)> {
    match salary_type {
        SalaryType::Monthly => {
            let raw = monthly_salary.ok_or(ValidationError::Required {
                field: "monthly_salary".to_string(),
            })?;
            let monthly = Money::parse_numeric(raw, "monthly_salary")?
                .ensure_fits_precision("monthly_salary", Precision::Standard)?;
            if require_positive && monthly.cents() <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "monthly_salary".to_string(),
                }
                .into());
            }
            Ok((monthly, None))
        }
        SalaryType::Percent => {
            let raw = salary_percent.ok_or(ValidationError::Required {
                field: "salary_percent".to_string(),
            })?;
            // Percent at scale 2 is exactly basis points
            let bps = Money::parse_numeric(raw, "salary_percent")?.cents();
            if require_positive && bps <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "salary_percent".to_string(),
                }
                .into());
            }
            Ok((Money::zero(), Some(bps)))
        }
    }
}

// =============================================================================
// Integration Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use resale_core::CoreError;

    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn percent_worker(percent: f64) -> CreateWorkerRequest {
        CreateWorkerRequest {
            full_name: "Bek".to_string(),
            phone_number: None,
            address: None,
            salary_type: SalaryType::Percent,
            monthly_salary: None,
            salary_percent: Some(percent),
            notes: None,
        }
    }

    fn monthly_worker(salary: f64) -> CreateWorkerRequest {
        CreateWorkerRequest {
            full_name: "Olim".to_string(),
            phone_number: None,
            address: None,
            salary_type: SalaryType::Monthly,
            monthly_salary: Some(salary),
            salary_percent: None,
            notes: None,
        }
    }

    fn payment(month: &str, amount: f64) -> PaySalaryRequest {
        PaySalaryRequest {
            month: month.to_string(),
            amount_paid: amount,
            paid_at: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_salary_shape_is_validated() {
        let db = test_db().await;

        let mut missing_monthly = monthly_worker(500.0);
        missing_monthly.monthly_salary = None;
        assert!(db.workers().create(missing_monthly).await.is_err());

        let mut zero_percent = percent_worker(0.0);
        zero_percent.salary_percent = Some(0.0);
        let err = db.workers().create(zero_percent).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
    }

    #[tokio::test]
    async fn test_percent_stored_as_basis_points() {
        let db = test_db().await;
        let worker = db.workers().create(percent_worker(12.5)).await.unwrap();

        assert_eq!(worker.salary_type, SalaryType::Percent);
        assert_eq!(worker.salary_percent_bps, Some(1250));
        assert_eq!(worker.monthly_salary_cents, 0);
    }

    #[tokio::test]
    async fn test_accrual_for_percent_worker() {
        let db = test_db().await;
        let worker = db.workers().create(percent_worker(10.0)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        WorkerLedger::accrue_on_sale(
            &mut conn,
            &worker,
            2,
            Money::from_cents(200_000), // $2000.00 sale
            Money::from_cents(100_000), // $1000.00 profit
            Utc::now(),
        )
        .await
        .unwrap();
        drop(conn);

        let fresh = db.workers().get_active_by_id(worker.id).await.unwrap();
        assert_eq!(fresh.sold_phones_count, 2);
        assert_eq!(fresh.total_sold_cents, 200_000);
        assert_eq!(fresh.total_profit_cents, 100_000);
        assert_eq!(fresh.percent_salary_accrued_cents, 10_000);
    }

    #[tokio::test]
    async fn test_accrual_for_monthly_worker_skips_commission() {
        let db = test_db().await;
        let worker = db.workers().create(monthly_worker(800.0)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        WorkerLedger::accrue_on_sale(
            &mut conn,
            &worker,
            1,
            Money::from_cents(50_000),
            Money::from_cents(20_000),
            Utc::now(),
        )
        .await
        .unwrap();
        drop(conn);

        let fresh = db.workers().get_active_by_id(worker.id).await.unwrap();
        assert_eq!(fresh.sold_phones_count, 1);
        assert_eq!(fresh.total_sold_cents, 50_000);
        assert_eq!(fresh.percent_salary_accrued_cents, 0);
    }

    #[tokio::test]
    async fn test_partial_payout_keeps_cycle_counters() {
        let db = test_db().await;
        let worker = db.workers().create(percent_worker(10.0)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        WorkerLedger::accrue_on_sale(
            &mut conn,
            &worker,
            1,
            Money::from_cents(150_000),
            Money::from_cents(100_000),
            Utc::now(),
        )
        .await
        .unwrap();
        drop(conn);

        // $40.00 of the accrued $100.00
        db.workers().pay(worker.id, payment("2026-08", 40.0)).await.unwrap();
        let partial = db.workers().get_active_by_id(worker.id).await.unwrap();
        assert_eq!(partial.percent_salary_accrued_cents, 6000);
        assert_eq!(partial.sold_phones_count, 1);
        assert_eq!(partial.total_profit_cents, 100_000);

        // The remaining $60.00 closes the cycle
        db.workers().pay(worker.id, payment("2026-08", 60.0)).await.unwrap();
        let full = db.workers().get_active_by_id(worker.id).await.unwrap();
        assert_eq!(full.percent_salary_accrued_cents, 0);
        assert_eq!(full.sold_phones_count, 0);
        assert_eq!(full.total_profit_cents, 0);
    }

    #[tokio::test]
    async fn test_overpayment_floors_at_zero() {
        let db = test_db().await;
        let worker = db.workers().create(percent_worker(10.0)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        WorkerLedger::accrue_on_sale(
            &mut conn,
            &worker,
            1,
            Money::from_cents(50_000),
            Money::from_cents(30_000),
            Utc::now(),
        )
        .await
        .unwrap();
        drop(conn);

        // Accrued $30.00; pay $100.00 anyway
        db.workers().pay(worker.id, payment("2026-08", 100.0)).await.unwrap();
        let fresh = db.workers().get_active_by_id(worker.id).await.unwrap();
        assert_eq!(fresh.percent_salary_accrued_cents, 0);
        assert_eq!(fresh.sold_phones_count, 0);
    }

    #[tokio::test]
    async fn test_month_format_is_enforced() {
        let db = test_db().await;
        let worker = db.workers().create(monthly_worker(900.0)).await.unwrap();

        let err = db
            .workers()
            .pay(worker.id, payment("2026/08", 100.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidMonth { .. })
        ));
    }

    #[tokio::test]
    async fn test_monthly_remaining_is_derived() {
        let db = test_db().await;
        let worker = db.workers().create(monthly_worker(800.0)).await.unwrap();

        db.workers().pay(worker.id, payment("2026-08", 300.0)).await.unwrap();
        db.workers().pay(worker.id, payment("2026-08", 200.0)).await.unwrap();
        // A different month doesn't count against August
        db.workers().pay(worker.id, payment("2026-07", 500.0)).await.unwrap();

        let remaining = db.workers().monthly_remaining(worker.id, "2026-08").await.unwrap();
        assert_eq!(remaining.cents(), 30_000);

        // Payouts never touch stored monthly state
        let fresh = db.workers().get_active_by_id(worker.id).await.unwrap();
        assert_eq!(fresh.monthly_salary_cents, 80_000);
    }

    #[tokio::test]
    async fn test_switching_salary_type_zeroes_other_field() {
        let db = test_db().await;
        let worker = db.workers().create(monthly_worker(800.0)).await.unwrap();

        let switched = db
            .workers()
            .update_salary(
                worker.id,
                UpdateWorkerSalaryRequest {
                    salary_type: SalaryType::Percent,
                    monthly_salary: None,
                    salary_percent: Some(8.0),
                },
            )
            .await
            .unwrap();

        assert_eq!(switched.salary_type, SalaryType::Percent);
        assert_eq!(switched.salary_percent_bps, Some(800));
        assert_eq!(switched.monthly_salary_cents, 0);
    }

    #[tokio::test]
    async fn test_duplicate_active_phone_is_conflict() {
        let db = test_db().await;

        let mut first = monthly_worker(500.0);
        first.phone_number = Some("998901234567".to_string());
        db.workers().create(first).await.unwrap();

        let mut second = monthly_worker(600.0);
        second.phone_number = Some("+998901234567".to_string());
        let err = db.workers().create(second).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }
}
