//! Billing repository implementation
//!
//! Database access for invoices, invoice payments and receipts. Ledger
//! writes run in a single transaction guarded by the invoice `version`
//! column.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for invoices and their payment ledger
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    /// Creates a new BillingRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves an invoice by its identifier
    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<InvoiceRow, DatabaseError> {
        sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT invoice_id, invoice_number, customer_name, customer_email,
                   customer_phone, customer_address, currency, total, amount_paid,
                   status, due_date, paid_date, version, created_at, updated_at
            FROM invoices
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Invoice", invoice_id))
    }

    /// Inserts an invoice
    ///
    /// Invoices are owned by the back office; this is used to seed data.
    pub async fn insert_invoice(&self, invoice: &InvoiceRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_id, invoice_number, customer_name, customer_email,
                customer_phone, customer_address, currency, total, amount_paid,
                status, due_date, paid_date, version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(invoice.invoice_id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.customer_name)
        .bind(&invoice.customer_email)
        .bind(&invoice.customer_phone)
        .bind(&invoice.customer_address)
        .bind(&invoice.currency)
        .bind(invoice.total)
        .bind(invoice.amount_paid)
        .bind(invoice.status)
        .bind(invoice.due_date)
        .bind(invoice.paid_date)
        .bind(invoice.version)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts the payments recorded against an invoice
    pub async fn count_payments(&self, invoice_id: Uuid) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM invoice_payments WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Lists an invoice's payments, most recent first
    pub async fn list_payments(&self, invoice_id: Uuid) -> Result<Vec<PaymentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT payment_id, invoice_id, amount, currency, payment_method,
                   payment_type, reference, paid_at, notes, created_by,
                   receipt_id, created_at
            FROM invoice_payments
            WHERE invoice_id = $1
            ORDER BY paid_at DESC, created_at DESC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Retrieves a payment by its identifier
    pub async fn get_payment(&self, payment_id: Uuid) -> Result<PaymentRow, DatabaseError> {
        sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT payment_id, invoice_id, amount, currency, payment_method,
                   payment_type, reference, paid_at, notes, created_by,
                   receipt_id, created_at
            FROM invoice_payments
            WHERE payment_id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("InvoicePayment", payment_id))
    }

    /// Records a payment, its receipt and the invoice change atomically
    ///
    /// `number_for` turns the next value of `receipt_number_seq` into the
    /// receipt number.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::VersionConflict` if the invoice version no
    /// longer matches `change.expected_version`; nothing is written.
    pub async fn record_payment<F>(
        &self,
        change: &InvoiceChange,
        payment: &PaymentRow,
        receipt: &NewReceipt,
        number_for: F,
    ) -> Result<ReceiptRow, DatabaseError>
    where
        F: FnOnce(i64) -> String + Send,
    {
        let mut tx = self.pool.begin().await?;

        Self::update_invoice(&mut tx, change).await?;

        let sequence = sqlx::query_scalar::<_, i64>("SELECT nextval('receipt_number_seq')")
            .fetch_one(&mut *tx)
            .await?;
        let receipt_number = number_for(sequence);

        // Deferred FK: the payment points at a receipt inserted just below.
        sqlx::query(
            r#"
            INSERT INTO invoice_payments (
                payment_id, invoice_id, amount, currency, payment_method,
                payment_type, reference, paid_at, notes, created_by,
                receipt_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(payment.payment_id)
        .bind(payment.invoice_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.payment_method)
        .bind(payment.payment_type)
        .bind(&payment.reference)
        .bind(payment.paid_at)
        .bind(&payment.notes)
        .bind(&payment.created_by)
        .bind(payment.receipt_id)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, ReceiptRow>(
            r#"
            INSERT INTO receipts (
                receipt_id, receipt_number, invoice_id, invoice_number,
                invoice_payment_id, customer_name, customer_email, customer_phone,
                amount, currency, payment_method, payment_date, created_by_name,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING receipt_id, receipt_number, invoice_id, invoice_number,
                      invoice_payment_id, customer_name, customer_email, customer_phone,
                      amount, currency, payment_method, payment_date, created_by_name,
                      created_at
            "#,
        )
        .bind(receipt.receipt_id)
        .bind(&receipt_number)
        .bind(receipt.invoice_id)
        .bind(&receipt.invoice_number)
        .bind(receipt.invoice_payment_id)
        .bind(&receipt.customer_name)
        .bind(&receipt.customer_email)
        .bind(&receipt.customer_phone)
        .bind(receipt.amount)
        .bind(&receipt.currency)
        .bind(receipt.payment_method)
        .bind(receipt.payment_date)
        .bind(&receipt.created_by_name)
        .bind(receipt.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(receipt_number = %row.receipt_number, "Payment and receipt committed");
        Ok(row)
    }

    /// Deletes a payment and its receipt and applies the invoice change atomically
    pub async fn reverse_payment(
        &self,
        change: &InvoiceChange,
        payment_id: Uuid,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        Self::update_invoice(&mut tx, change).await?;

        // The receipt follows through ON DELETE CASCADE.
        let deleted = sqlx::query(
            "DELETE FROM invoice_payments WHERE payment_id = $1 AND invoice_id = $2",
        )
        .bind(payment_id)
        .bind(change.invoice_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted == 0 {
            return Err(DatabaseError::not_found("InvoicePayment", payment_id));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Lists an invoice's receipts, most recent payment date first
    pub async fn list_receipts(&self, invoice_id: Uuid) -> Result<Vec<ReceiptRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ReceiptRow>(
            r#"
            SELECT receipt_id, receipt_number, invoice_id, invoice_number,
                   invoice_payment_id, customer_name, customer_email, customer_phone,
                   amount, currency, payment_method, payment_date, created_by_name,
                   created_at
            FROM receipts
            WHERE invoice_id = $1
            ORDER BY payment_date DESC, receipt_number DESC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Retrieves a receipt by its identifier
    pub async fn get_receipt(&self, receipt_id: Uuid) -> Result<ReceiptRow, DatabaseError> {
        sqlx::query_as::<_, ReceiptRow>(
            r#"
            SELECT receipt_id, receipt_number, invoice_id, invoice_number,
                   invoice_payment_id, customer_name, customer_email, customer_phone,
                   amount, currency, payment_method, payment_date, created_by_name,
                   created_at
            FROM receipts
            WHERE receipt_id = $1
            "#,
        )
        .bind(receipt_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Receipt", receipt_id))
    }

    /// Compare-and-set update of the invoice's ledger columns
    async fn update_invoice(
        tx: &mut Transaction<'_, Postgres>,
        change: &InvoiceChange,
    ) -> Result<(), DatabaseError> {
        let updated = sqlx::query(
            r#"
            UPDATE invoices
            SET amount_paid = $3,
                status = $4,
                paid_date = $5,
                updated_at = $6,
                version = version + 1
            WHERE invoice_id = $1 AND version = $2
            "#,
        )
        .bind(change.invoice_id)
        .bind(change.expected_version)
        .bind(change.amount_paid)
        .bind(change.status)
        .bind(change.paid_date)
        .bind(change.updated_at)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if updated == 1 {
            return Ok(());
        }

        let current = sqlx::query_scalar::<_, i64>("SELECT version FROM invoices WHERE invoice_id = $1")
            .bind(change.invoice_id)
            .fetch_optional(&mut **tx)
            .await?;

        match current {
            Some(version) => Err(DatabaseError::VersionConflict(format!(
                "invoice {} is at version {}, expected {}",
                change.invoice_id, version, change.expected_version
            ))),
            None => Err(DatabaseError::not_found("Invoice", change.invoice_id)),
        }
    }
}

// ============================================================================
// Row Types
// ============================================================================

/// Database row for an invoice
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub currency: String,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub status: InvoiceStatus,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for an invoice payment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub payment_id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    pub reference: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub receipt_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Database row for a receipt
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReceiptRow {
    pub receipt_id: Uuid,
    pub receipt_number: String,
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub invoice_payment_id: Uuid,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_date: DateTime<Utc>,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
}

/// Receipt data before a number is assigned
#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub receipt_id: Uuid,
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub invoice_payment_id: Uuid,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_date: DateTime<Utc>,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
}

/// Guarded change to an invoice's ledger columns
#[derive(Debug, Clone)]
pub struct InvoiceChange {
    pub invoice_id: Uuid,
    pub expected_version: i64,
    pub amount_paid: Decimal,
    pub status: InvoiceStatus,
    pub paid_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Enum Types
// ============================================================================

/// Invoice status enum for database
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Partial,
    Paid,
    Overdue,
    Cancelled,
    Refunded,
}

/// Payment method enum for database
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Check,
    OrangeMoney,
    MtnMobileMoney,
    MoovMoney,
    Wave,
    #[sqlx(rename = "PAIEMENTPRO")]
    PaiementPro,
    Card,
    #[sqlx(rename = "PAYPAL")]
    PayPal,
    Other,
}

/// Payment type enum for database
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Deposit,
    Installment,
    Final,
}
