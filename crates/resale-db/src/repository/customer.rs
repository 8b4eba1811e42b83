//! # Customer Directory
//!
//! Customer lookups and the idempotent ensure-by-phone upsert the sale
//! coordinator and financed intake lean on.
//!
//! Phone number is the natural key: uniqueness is scoped to active rows
//! (partial unique index), and a tombstoned customer with the same phone
//! is reactivated instead of duplicated, preserving foreign-key history.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use resale_core::{Customer, SaleCustomerRequest, ValidationError};

use crate::error::{DbError, DbResult};

const CUSTOMER_COLUMNS: &str = r#"
    id, full_name, phone_number, address, passport_id, notes,
    is_active, created_at, updated_at, deleted_at
"#;

/// Customer lookups and ensure-by-phone upsert.
#[derive(Debug, Clone)]
pub struct CustomerDirectory {
    pool: SqlitePool,
}

impl CustomerDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerDirectory { pool }
    }

    /// Fetches an active customer by id, failing with `NotFound`.
    pub async fn get_active_by_id(&self, id: i64) -> DbResult<Customer> {
        let mut conn = self.pool.acquire().await?;
        Self::get_active(&mut conn, id).await
    }

    /// Idempotent upsert keyed by phone number.
    pub async fn ensure_by_phone(&self, request: &SaleCustomerRequest) -> DbResult<Customer> {
        let mut tx = self.pool.begin().await?;
        let customer = Self::ensure(&mut tx, request, Utc::now()).await?;
        tx.commit().await?;
        Ok(customer)
    }

    // =========================================================================
    // In-transaction operations
    // =========================================================================

    /// Active customer by id or `NotFound`.
    pub async fn get_active(conn: &mut SqliteConnection, id: i64) -> DbResult<Customer> {
        Self::find_active_by_id(conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Active customer by id, if any.
    pub async fn find_active_by_id(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> DbResult<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1 AND is_active = 1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row)
    }

    /// Active customer by phone, if any.
    pub async fn find_active_by_phone(
        conn: &mut SqliteConnection,
        phone_number: &str,
    ) -> DbResult<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone_number = ?1 AND is_active = 1"
        ))
        .bind(phone_number)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row)
    }

    /// Latest customer row for a phone, tombstoned rows included.
    async fn find_latest_by_phone(
        conn: &mut SqliteConnection,
        phone_number: &str,
    ) -> DbResult<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone_number = ?1 ORDER BY id DESC LIMIT 1"
        ))
        .bind(phone_number)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row)
    }

    /// Idempotent upsert keyed by phone number.
    ///
    /// Returns the existing active record (refreshed with any provided
    /// details), reactivates a tombstoned one, or creates a new row.
    pub async fn ensure(
        conn: &mut SqliteConnection,
        request: &SaleCustomerRequest,
        now: DateTime<Utc>,
    ) -> DbResult<Customer> {
        let phone = request.phone_number.trim();
        if phone.is_empty() {
            return Err(ValidationError::Required {
                field: "customer.phone_number".to_string(),
            }
            .into());
        }

        let full_name = request
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let address = request
            .address
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let existing = Self::find_latest_by_phone(conn, phone).await?;

        match existing {
            Some(customer) if customer.is_active => {
                // Refresh provided details on the live record
                sqlx::query(
                    r#"
                    UPDATE customers
                    SET full_name = ?2, address = COALESCE(?3, address), updated_at = ?4
                    WHERE id = ?1
                    "#,
                )
                .bind(customer.id)
                .bind(full_name.unwrap_or(&customer.full_name))
                .bind(address)
                .bind(now)
                .execute(&mut *conn)
                .await?;

                Self::get_active(conn, customer.id).await
            }
            Some(customer) => {
                // Reactivate the tombstoned row; passport/notes survive
                debug!(customer_id = customer.id, "Reactivating tombstoned customer");
                sqlx::query(
                    r#"
                    UPDATE customers
                    SET full_name = ?2, address = COALESCE(?3, address),
                        is_active = 1, deleted_at = NULL, updated_at = ?4
                    WHERE id = ?1
                    "#,
                )
                .bind(customer.id)
                .bind(full_name.unwrap_or("Unknown customer"))
                .bind(address)
                .bind(now)
                .execute(&mut *conn)
                .await?;

                Self::get_active(conn, customer.id).await
            }
            None => {
                let id = Self::create(
                    conn,
                    full_name.unwrap_or("Unknown customer"),
                    phone,
                    address,
                    request.passport_id.as_deref(),
                    request.notes.as_deref(),
                    now,
                )
                .await?;
                Self::get_active(conn, id).await
            }
        }
    }

    /// Inserts a fresh customer row.
    pub async fn create(
        conn: &mut SqliteConnection,
        full_name: &str,
        phone_number: &str,
        address: Option<&str>,
        passport_id: Option<&str>,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO customers
                (full_name, phone_number, address, passport_id, notes,
                 is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
            "#,
        )
        .bind(full_name)
        .bind(phone_number)
        .bind(address)
        .bind(passport_id)
        .bind(notes)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Overwrites contact details on an existing customer.
    pub async fn update_contact(
        conn: &mut SqliteConnection,
        id: i64,
        full_name: &str,
        phone_number: &str,
        address: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE customers
            SET full_name = ?2, phone_number = ?3,
                address = COALESCE(?4, address), updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(phone_number)
        .bind(address)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
