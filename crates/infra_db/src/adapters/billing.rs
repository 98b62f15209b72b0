//! PostgreSQL Billing Adapter
//!
//! Implements `InvoiceLedgerPort` on top of the `BillingRepository`,
//! translating between domain models and row types.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresBillingAdapter;
//! use domain_billing::{InvoiceLedgerPort, PaymentLedgerService};
//! use std::sync::Arc;
//!
//! let port: Arc<dyn InvoiceLedgerPort> = Arc::new(PostgresBillingAdapter::new(pool));
//! let service = PaymentLedgerService::new(port);
//! ```

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, Currency, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId, Money,
    PaymentId, PortError, ReceiptId,
};
use domain_billing::{
    CustomerContact, Invoice, InvoiceLedgerPort, InvoicePayment, InvoiceStatus, InvoiceUpdate,
    PaymentMethod, PaymentPlan, PaymentType, Receipt, ReceiptNumber, ReversalPlan,
};

use crate::repositories::billing::{
    BillingRepository, InvoiceChange, InvoiceRow, NewReceipt, PaymentRow, ReceiptRow,
    InvoiceStatus as DbInvoiceStatus, PaymentMethod as DbPaymentMethod,
    PaymentType as DbPaymentType,
};

const ADAPTER_ID: &str = "postgres-billing-adapter";

/// PostgreSQL-backed implementation of the InvoiceLedgerPort trait
///
/// Database errors are translated through `From<DatabaseError> for PortError`;
/// a failed version check surfaces as `PortError::Conflict`.
#[derive(Debug, Clone)]
pub struct PostgresBillingAdapter {
    repository: BillingRepository,
    pool: PgPool,
}

impl PostgresBillingAdapter {
    /// Creates a new PostgreSQL billing adapter
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BillingRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &BillingRepository {
        &self.repository
    }

    /// Inserts an invoice; used to seed data and in tests
    pub async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
        self.repository
            .insert_invoice(&invoice_to_row(invoice))
            .await
            .map_err(PortError::from)
    }
}

impl DomainPort for PostgresBillingAdapter {}

#[async_trait]
impl HealthCheckable for PostgresBillingAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };

        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl InvoiceLedgerPort for PostgresBillingAdapter {
    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        debug!("Fetching invoice");
        let row = self.repository.get_invoice(id.into()).await?;
        row_to_invoice(row)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn count_payments(&self, invoice_id: InvoiceId) -> Result<u64, PortError> {
        let count = self.repository.count_payments(invoice_id.into()).await?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn list_payments(&self, invoice_id: InvoiceId) -> Result<Vec<InvoicePayment>, PortError> {
        self.repository
            .list_payments(invoice_id.into())
            .await?
            .into_iter()
            .map(row_to_payment)
            .collect()
    }

    #[instrument(skip(self), fields(payment_id = %id))]
    async fn get_payment(&self, id: PaymentId) -> Result<InvoicePayment, PortError> {
        let row = self.repository.get_payment(id.into()).await?;
        row_to_payment(row)
    }

    #[instrument(skip(self, plan), fields(invoice_id = %plan.invoice.invoice_id, payment_id = %plan.payment.id))]
    async fn record_payment(&self, plan: &PaymentPlan) -> Result<Receipt, PortError> {
        let year = plan.payment.created_at.year();
        let row = self
            .repository
            .record_payment(
                &update_to_change(&plan.invoice),
                &payment_to_row(&plan.payment),
                &NewReceipt {
                    receipt_id: plan.receipt.id.into(),
                    invoice_id: plan.receipt.invoice_id.into(),
                    invoice_number: plan.receipt.invoice_number.clone(),
                    invoice_payment_id: plan.receipt.invoice_payment_id.into(),
                    customer_name: plan.receipt.customer_name.clone(),
                    customer_email: plan.receipt.customer_email.clone(),
                    customer_phone: plan.receipt.customer_phone.clone(),
                    amount: plan.receipt.amount.amount(),
                    currency: plan.receipt.amount.currency().code().to_string(),
                    payment_method: method_to_db(plan.receipt.payment_method),
                    payment_date: plan.receipt.payment_date,
                    created_by_name: plan.receipt.created_by_name.clone(),
                    created_at: plan.receipt.created_at,
                },
                |sequence| ReceiptNumber::from_sequence(year, sequence).to_string(),
            )
            .await?;

        row_to_receipt(row)
    }

    #[instrument(skip(self, plan), fields(invoice_id = %plan.invoice.invoice_id, payment_id = %plan.payment.id))]
    async fn reverse_payment(&self, plan: &ReversalPlan) -> Result<(), PortError> {
        self.repository
            .reverse_payment(&update_to_change(&plan.invoice), plan.payment.id.into())
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn list_receipts(&self, invoice_id: InvoiceId) -> Result<Vec<Receipt>, PortError> {
        self.repository
            .list_receipts(invoice_id.into())
            .await?
            .into_iter()
            .map(row_to_receipt)
            .collect()
    }

    #[instrument(skip(self), fields(receipt_id = %id))]
    async fn get_receipt(&self, id: ReceiptId) -> Result<Receipt, PortError> {
        let row = self.repository.get_receipt(id.into()).await?;
        row_to_receipt(row)
    }
}

// =============================================================================
// Conversion Functions
// =============================================================================

fn parse_currency(code: &str) -> Result<Currency, PortError> {
    Currency::from_str(code.trim())
        .map_err(|e| PortError::internal(format!("Stored currency is invalid: {}", e)))
}

fn row_to_invoice(row: InvoiceRow) -> Result<Invoice, PortError> {
    let currency = parse_currency(&row.currency)?;

    Ok(Invoice {
        id: InvoiceId::from(row.invoice_id),
        invoice_number: row.invoice_number,
        customer: CustomerContact {
            name: row.customer_name,
            email: row.customer_email,
            phone: row.customer_phone,
            address: row.customer_address,
        },
        total: Money::new(row.total, currency),
        amount_paid: Money::new(row.amount_paid, currency),
        status: status_from_db(row.status),
        due_date: row.due_date,
        paid_date: row.paid_date,
        version: row.version,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn invoice_to_row(invoice: &Invoice) -> InvoiceRow {
    InvoiceRow {
        invoice_id: invoice.id.into(),
        invoice_number: invoice.invoice_number.clone(),
        customer_name: invoice.customer.name.clone(),
        customer_email: invoice.customer.email.clone(),
        customer_phone: invoice.customer.phone.clone(),
        customer_address: invoice.customer.address.clone(),
        currency: invoice.currency().code().to_string(),
        total: invoice.total.amount(),
        amount_paid: invoice.amount_paid.amount(),
        status: status_to_db(invoice.status),
        due_date: invoice.due_date,
        paid_date: invoice.paid_date,
        version: invoice.version,
        created_at: invoice.created_at,
        updated_at: invoice.updated_at,
    }
}

fn row_to_payment(row: PaymentRow) -> Result<InvoicePayment, PortError> {
    let currency = parse_currency(&row.currency)?;

    Ok(InvoicePayment {
        id: PaymentId::from(row.payment_id),
        invoice_id: InvoiceId::from(row.invoice_id),
        amount: Money::new(row.amount, currency),
        method: method_from_db(row.payment_method),
        payment_type: type_from_db(row.payment_type),
        reference: row.reference,
        paid_at: row.paid_at,
        notes: row.notes,
        created_by: row.created_by,
        receipt_id: ReceiptId::from(row.receipt_id),
        created_at: row.created_at,
    })
}

fn payment_to_row(payment: &InvoicePayment) -> PaymentRow {
    PaymentRow {
        payment_id: payment.id.into(),
        invoice_id: payment.invoice_id.into(),
        amount: payment.amount.amount(),
        currency: payment.amount.currency().code().to_string(),
        payment_method: method_to_db(payment.method),
        payment_type: type_to_db(payment.payment_type),
        reference: payment.reference.clone(),
        paid_at: payment.paid_at,
        notes: payment.notes.clone(),
        created_by: payment.created_by.clone(),
        receipt_id: payment.receipt_id.into(),
        created_at: payment.created_at,
    }
}

fn row_to_receipt(row: ReceiptRow) -> Result<Receipt, PortError> {
    let currency = parse_currency(&row.currency)?;

    Ok(Receipt {
        id: ReceiptId::from(row.receipt_id),
        receipt_number: ReceiptNumber::from_string(row.receipt_number),
        invoice_id: InvoiceId::from(row.invoice_id),
        invoice_number: row.invoice_number,
        invoice_payment_id: PaymentId::from(row.invoice_payment_id),
        customer_name: row.customer_name,
        customer_email: row.customer_email,
        customer_phone: row.customer_phone,
        amount: Money::new(row.amount, currency),
        payment_method: method_from_db(row.payment_method),
        payment_date: row.payment_date,
        created_by_name: row.created_by_name,
        created_at: row.created_at,
    })
}

fn update_to_change(update: &InvoiceUpdate) -> InvoiceChange {
    InvoiceChange {
        invoice_id: update.invoice_id.into(),
        expected_version: update.expected_version,
        amount_paid: update.amount_paid.amount(),
        status: status_to_db(update.status),
        paid_date: update.paid_date,
        updated_at: update.updated_at,
    }
}

fn status_from_db(status: DbInvoiceStatus) -> InvoiceStatus {
    match status {
        DbInvoiceStatus::Draft => InvoiceStatus::Draft,
        DbInvoiceStatus::Sent => InvoiceStatus::Sent,
        DbInvoiceStatus::Partial => InvoiceStatus::Partial,
        DbInvoiceStatus::Paid => InvoiceStatus::Paid,
        DbInvoiceStatus::Overdue => InvoiceStatus::Overdue,
        DbInvoiceStatus::Cancelled => InvoiceStatus::Cancelled,
        DbInvoiceStatus::Refunded => InvoiceStatus::Refunded,
    }
}

fn status_to_db(status: InvoiceStatus) -> DbInvoiceStatus {
    match status {
        InvoiceStatus::Draft => DbInvoiceStatus::Draft,
        InvoiceStatus::Sent => DbInvoiceStatus::Sent,
        InvoiceStatus::Partial => DbInvoiceStatus::Partial,
        InvoiceStatus::Paid => DbInvoiceStatus::Paid,
        InvoiceStatus::Overdue => DbInvoiceStatus::Overdue,
        InvoiceStatus::Cancelled => DbInvoiceStatus::Cancelled,
        InvoiceStatus::Refunded => DbInvoiceStatus::Refunded,
    }
}

fn method_from_db(method: DbPaymentMethod) -> PaymentMethod {
    match method {
        DbPaymentMethod::Cash => PaymentMethod::Cash,
        DbPaymentMethod::BankTransfer => PaymentMethod::BankTransfer,
        DbPaymentMethod::Check => PaymentMethod::Check,
        DbPaymentMethod::OrangeMoney => PaymentMethod::OrangeMoney,
        DbPaymentMethod::MtnMobileMoney => PaymentMethod::MtnMobileMoney,
        DbPaymentMethod::MoovMoney => PaymentMethod::MoovMoney,
        DbPaymentMethod::Wave => PaymentMethod::Wave,
        DbPaymentMethod::PaiementPro => PaymentMethod::PaiementPro,
        DbPaymentMethod::Card => PaymentMethod::Card,
        DbPaymentMethod::PayPal => PaymentMethod::PayPal,
        DbPaymentMethod::Other => PaymentMethod::Other,
    }
}

fn method_to_db(method: PaymentMethod) -> DbPaymentMethod {
    match method {
        PaymentMethod::Cash => DbPaymentMethod::Cash,
        PaymentMethod::BankTransfer => DbPaymentMethod::BankTransfer,
        PaymentMethod::Check => DbPaymentMethod::Check,
        PaymentMethod::OrangeMoney => DbPaymentMethod::OrangeMoney,
        PaymentMethod::MtnMobileMoney => DbPaymentMethod::MtnMobileMoney,
        PaymentMethod::MoovMoney => DbPaymentMethod::MoovMoney,
        PaymentMethod::Wave => DbPaymentMethod::Wave,
        PaymentMethod::PaiementPro => DbPaymentMethod::PaiementPro,
        PaymentMethod::Card => DbPaymentMethod::Card,
        PaymentMethod::PayPal => DbPaymentMethod::PayPal,
        PaymentMethod::Other => DbPaymentMethod::Other,
    }
}

fn type_from_db(kind: DbPaymentType) -> PaymentType {
    match kind {
        DbPaymentType::Deposit => PaymentType::Deposit,
        DbPaymentType::Installment => PaymentType::Installment,
        DbPaymentType::Final => PaymentType::Final,
    }
}

fn type_to_db(kind: PaymentType) -> DbPaymentType {
    match kind {
        PaymentType::Deposit => DbPaymentType::Deposit,
        PaymentType::Installment => DbPaymentType::Installment,
        PaymentType::Final => DbPaymentType::Final,
    }
}
