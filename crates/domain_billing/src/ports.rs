//! Billing Domain Ports
//!
//! The `InvoiceLedgerPort` trait is everything the payment ledger needs from
//! its storage. Adapters:
//!
//! - **PostgreSQL**: `infra_db::adapters::PostgresBillingAdapter`
//! - **Mock**: in-memory [`mock::MockInvoiceLedgerPort`] for tests
//!   (enabled with the `mock` feature)
//!
//! # Atomicity
//!
//! `record_payment` and `reverse_payment` must apply their plan as a single
//! unit: the invoice update, the payment row and the receipt row either all
//! change or none do. Both must fail with `PortError::Conflict` when the
//! stored invoice version differs from `plan.invoice.expected_version`.

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, InvoiceId, PaymentId, PortError, ReceiptId};

use crate::invoice::Invoice;
use crate::ledger::{PaymentPlan, ReversalPlan};
use crate::payment::InvoicePayment;
use crate::receipt::Receipt;

/// Storage port for the invoice payment ledger
#[async_trait]
pub trait InvoiceLedgerPort: DomainPort + HealthCheckable {
    /// Retrieves an invoice by ID
    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError>;

    /// Counts payments recorded against an invoice
    async fn count_payments(&self, invoice_id: InvoiceId) -> Result<u64, PortError>;

    /// Lists an invoice's payments, most recent `paid_at` first
    async fn list_payments(&self, invoice_id: InvoiceId) -> Result<Vec<InvoicePayment>, PortError>;

    /// Retrieves a payment by ID, whatever invoice it belongs to
    async fn get_payment(&self, id: PaymentId) -> Result<InvoicePayment, PortError>;

    /// Persists a payment plan and returns the numbered receipt
    async fn record_payment(&self, plan: &PaymentPlan) -> Result<Receipt, PortError>;

    /// Deletes the payment and its receipt and applies the invoice update
    async fn reverse_payment(&self, plan: &ReversalPlan) -> Result<(), PortError>;

    /// Lists an invoice's receipts, most recent payment date first
    async fn list_receipts(&self, invoice_id: InvoiceId) -> Result<Vec<Receipt>, PortError>;

    /// Retrieves a receipt by ID
    async fn get_receipt(&self, id: ReceiptId) -> Result<Receipt, PortError>;
}

/// In-memory implementation for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::{Datelike, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    use crate::ledger::InvoiceUpdate;
    use crate::receipt::ReceiptNumber;

    #[derive(Debug, Default)]
    struct LedgerState {
        invoices: HashMap<InvoiceId, Invoice>,
        payments: HashMap<PaymentId, InvoicePayment>,
        receipts: HashMap<ReceiptId, Receipt>,
        receipt_sequence: i64,
    }

    impl LedgerState {
        fn apply_update(&mut self, update: &InvoiceUpdate) -> Result<(), PortError> {
            let invoice = self
                .invoices
                .get_mut(&update.invoice_id)
                .ok_or_else(|| PortError::not_found("Invoice", update.invoice_id))?;

            if invoice.version != update.expected_version {
                return Err(PortError::conflict(format!(
                    "invoice {} is at version {}, expected {}",
                    invoice.invoice_number, invoice.version, update.expected_version
                )));
            }

            invoice.apply_update(update);
            Ok(())
        }
    }

    /// In-memory mock implementation of InvoiceLedgerPort
    ///
    /// All writes run under one lock, so plans apply atomically.
    #[derive(Debug, Default)]
    pub struct MockInvoiceLedgerPort {
        state: Arc<RwLock<LedgerState>>,
        unavailable: AtomicBool,
    }

    impl MockInvoiceLedgerPort {
        /// Creates a new empty mock port
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with invoices for testing
        pub async fn with_invoices(invoices: Vec<Invoice>) -> Self {
            let port = Self::new();
            for invoice in invoices {
                port.insert_invoice(invoice).await;
            }
            port
        }

        /// Adds or replaces an invoice
        pub async fn insert_invoice(&self, invoice: Invoice) {
            self.state.write().await.invoices.insert(invoice.id, invoice);
        }

        /// Makes every subsequent call fail with a connection error
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Number of receipts currently stored
        pub async fn receipt_count(&self) -> usize {
            self.state.read().await.receipts.len()
        }

        fn ensure_available(&self) -> Result<(), PortError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(PortError::connection("mock ledger is unavailable"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockInvoiceLedgerPort {}

    #[async_trait]
    impl HealthCheckable for MockInvoiceLedgerPort {
        async fn health_check(&self) -> HealthCheckResult {
            let (status, message) = if self.unavailable.load(Ordering::SeqCst) {
                (AdapterHealth::Unhealthy, "Mock adapter marked unavailable")
            } else {
                (AdapterHealth::Healthy, "Mock adapter always healthy")
            };

            HealthCheckResult {
                adapter_id: "mock-invoice-ledger-port".to_string(),
                status,
                latency_ms: 0,
                message: Some(message.to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl InvoiceLedgerPort for MockInvoiceLedgerPort {
        async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
            self.ensure_available()?;
            self.state
                .read()
                .await
                .invoices
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Invoice", id))
        }

        async fn count_payments(&self, invoice_id: InvoiceId) -> Result<u64, PortError> {
            self.ensure_available()?;
            let state = self.state.read().await;
            Ok(state.payments.values().filter(|p| p.invoice_id == invoice_id).count() as u64)
        }

        async fn list_payments(&self, invoice_id: InvoiceId) -> Result<Vec<InvoicePayment>, PortError> {
            self.ensure_available()?;
            let state = self.state.read().await;
            let mut payments: Vec<_> = state
                .payments
                .values()
                .filter(|p| p.invoice_id == invoice_id)
                .cloned()
                .collect();
            payments.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
            Ok(payments)
        }

        async fn get_payment(&self, id: PaymentId) -> Result<InvoicePayment, PortError> {
            self.ensure_available()?;
            self.state
                .read()
                .await
                .payments
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("InvoicePayment", id))
        }

        async fn record_payment(&self, plan: &PaymentPlan) -> Result<Receipt, PortError> {
            self.ensure_available()?;
            let mut state = self.state.write().await;

            state.apply_update(&plan.invoice)?;

            state.receipt_sequence += 1;
            let number = ReceiptNumber::from_sequence(
                plan.payment.created_at.year(),
                state.receipt_sequence,
            );
            let receipt = plan.receipt.clone().issue(number);

            state.payments.insert(plan.payment.id, plan.payment.clone());
            state.receipts.insert(receipt.id, receipt.clone());
            Ok(receipt)
        }

        async fn reverse_payment(&self, plan: &ReversalPlan) -> Result<(), PortError> {
            self.ensure_available()?;
            let mut state = self.state.write().await;

            if !state.payments.contains_key(&plan.payment.id) {
                return Err(PortError::not_found("InvoicePayment", plan.payment.id));
            }

            state.apply_update(&plan.invoice)?;
            state.receipts.remove(&plan.payment.receipt_id);
            state.payments.remove(&plan.payment.id);
            Ok(())
        }

        async fn list_receipts(&self, invoice_id: InvoiceId) -> Result<Vec<Receipt>, PortError> {
            self.ensure_available()?;
            let state = self.state.read().await;
            let mut receipts: Vec<_> = state
                .receipts
                .values()
                .filter(|r| r.invoice_id == invoice_id)
                .cloned()
                .collect();
            receipts.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
            Ok(receipts)
        }

        async fn get_receipt(&self, id: ReceiptId) -> Result<Receipt, PortError> {
            self.ensure_available()?;
            self.state
                .read()
                .await
                .receipts
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Receipt", id))
        }
    }
}
