//! Payment ledger application service
//!
//! Orchestrates reads through the [`InvoiceLedgerPort`], the pure rules in
//! [`PaymentLedger`], and the atomic writes back through the port.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use core_kernel::{HealthCheckResult, HealthCheckable, InvoiceId, Money, PaymentId, PortError, ReceiptId};

use crate::error::BillingError;
use crate::invoice::InvoiceStatus;
use crate::ledger::{PaymentLedger, PaymentSummary};
use crate::payment::{InvoicePayment, NewPayment};
use crate::ports::InvoiceLedgerPort;
use crate::receipt::Receipt;

/// Invoice state reported after a payment is recorded
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InvoicePaymentState {
    pub amount_paid: Money,
    pub remaining_balance: Money,
    pub status: InvoiceStatus,
    pub is_fully_paid: bool,
}

/// Result of recording a payment
#[derive(Debug, Clone)]
pub struct RecordedPayment {
    pub payment: InvoicePayment,
    pub receipt: Receipt,
    pub invoice: InvoicePaymentState,
}

/// An invoice's payments with its paid-to-date summary
#[derive(Debug, Clone)]
pub struct PaymentListing {
    pub payments: Vec<InvoicePayment>,
    pub summary: PaymentSummary,
}

/// Result of deleting a payment
#[derive(Debug, Clone)]
pub struct PaymentReversal {
    pub payment: InvoicePayment,
    pub new_amount_paid: Money,
    pub new_status: InvoiceStatus,
}

/// Application service for the invoice payment ledger
#[derive(Clone)]
pub struct PaymentLedgerService {
    port: Arc<dyn InvoiceLedgerPort>,
}

impl PaymentLedgerService {
    /// Creates the service on top of a storage port
    pub fn new(port: Arc<dyn InvoiceLedgerPort>) -> Self {
        Self { port }
    }

    /// Records a payment against an invoice and issues its receipt
    ///
    /// # Errors
    ///
    /// * `InvoiceNotFound` if the invoice does not exist
    /// * `InvalidAmount` / `InvoiceNotPayable` from the ledger rules
    /// * `ConcurrentModification` if the invoice changed while recording
    #[instrument(skip(self, request), fields(invoice_id = %invoice_id, amount = %request.amount))]
    pub async fn add_payment(
        &self,
        invoice_id: InvoiceId,
        request: NewPayment,
    ) -> Result<RecordedPayment, BillingError> {
        let invoice = self
            .port
            .get_invoice(invoice_id)
            .await
            .map_err(|e| missing_as(e, || BillingError::InvoiceNotFound(invoice_id.to_string())))?;
        let prior_payments = self.port.count_payments(invoice_id).await?;

        let plan = PaymentLedger::plan_payment(&invoice, prior_payments, request, Utc::now())?;

        if let Some(excess) = plan.overpayment {
            warn!(
                invoice_number = %invoice.invoice_number,
                remaining = %invoice.remaining_balance(),
                payment = %plan.payment.amount,
                excess = %excess,
                "Payment exceeds remaining balance"
            );
        }

        let receipt = self.port.record_payment(&plan).await?;

        info!(
            invoice_number = %invoice.invoice_number,
            payment_id = %plan.payment.id,
            receipt_number = %receipt.receipt_number,
            payment_type = %plan.payment.payment_type,
            method = %plan.payment.method,
            status = %plan.invoice.status,
            "Payment recorded"
        );

        let remaining_balance = Money::new(
            invoice.total.amount() - plan.invoice.amount_paid.amount(),
            invoice.currency(),
        );

        Ok(RecordedPayment {
            invoice: InvoicePaymentState {
                amount_paid: plan.invoice.amount_paid,
                remaining_balance,
                status: plan.invoice.status,
                is_fully_paid: plan.is_fully_paid,
            },
            payment: plan.payment,
            receipt,
        })
    }

    /// Lists an invoice's payments, most recent first, with its summary
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn list_payments(&self, invoice_id: InvoiceId) -> Result<PaymentListing, BillingError> {
        let invoice = self
            .port
            .get_invoice(invoice_id)
            .await
            .map_err(|e| missing_as(e, || BillingError::InvoiceNotFound(invoice_id.to_string())))?;

        let payments = self.port.list_payments(invoice_id).await?;

        Ok(PaymentListing {
            payments,
            summary: PaymentSummary::of(&invoice),
        })
    }

    /// Deletes a payment with its receipt and reverses it on the invoice
    ///
    /// # Errors
    ///
    /// * `InvoiceNotFound` / `PaymentNotFound` for unknown identifiers
    /// * `PaymentInvoiceMismatch` if the payment belongs to another invoice
    #[instrument(skip(self), fields(invoice_id = %invoice_id, payment_id = %payment_id))]
    pub async fn delete_payment(
        &self,
        invoice_id: InvoiceId,
        payment_id: PaymentId,
    ) -> Result<PaymentReversal, BillingError> {
        let invoice = self
            .port
            .get_invoice(invoice_id)
            .await
            .map_err(|e| missing_as(e, || BillingError::InvoiceNotFound(invoice_id.to_string())))?;
        let payment = self
            .port
            .get_payment(payment_id)
            .await
            .map_err(|e| missing_as(e, || BillingError::PaymentNotFound(payment_id.to_string())))?;

        let plan = PaymentLedger::plan_reversal(&invoice, payment, Utc::now())?;
        self.port
            .reverse_payment(&plan)
            .await
            .map_err(|e| missing_as(e, || BillingError::PaymentNotFound(payment_id.to_string())))?;

        info!(
            invoice_number = %invoice.invoice_number,
            amount = %plan.payment.amount,
            new_amount_paid = %plan.invoice.amount_paid,
            new_status = %plan.invoice.status,
            "Payment deleted"
        );

        Ok(PaymentReversal {
            new_amount_paid: plan.invoice.amount_paid,
            new_status: plan.invoice.status,
            payment: plan.payment,
        })
    }

    /// Lists the receipts issued for an invoice
    pub async fn list_receipts(&self, invoice_id: InvoiceId) -> Result<Vec<Receipt>, BillingError> {
        self.port
            .get_invoice(invoice_id)
            .await
            .map_err(|e| missing_as(e, || BillingError::InvoiceNotFound(invoice_id.to_string())))?;

        Ok(self.port.list_receipts(invoice_id).await?)
    }

    /// Retrieves one receipt
    pub async fn get_receipt(&self, receipt_id: ReceiptId) -> Result<Receipt, BillingError> {
        self.port
            .get_receipt(receipt_id)
            .await
            .map_err(|e| missing_as(e, || BillingError::ReceiptNotFound(receipt_id.to_string())))
    }

    /// Health of the underlying storage adapter
    pub async fn storage_health(&self) -> HealthCheckResult {
        HealthCheckable::health_check(self.port.as_ref()).await
    }
}

/// Maps a port `NotFound` to a domain-specific error
fn missing_as(error: PortError, not_found: impl FnOnce() -> BillingError) -> BillingError {
    if error.is_not_found() {
        not_found()
    } else {
        error.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{CustomerContact, Invoice};
    use crate::payment::{PaymentMethod, PaymentType, Recorder};
    use crate::ports::mock::MockInvoiceLedgerPort;
    use core_kernel::Currency;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn sent_invoice(total: Decimal) -> Invoice {
        Invoice::new(
            "INV-2026-0042",
            CustomerContact::named("Kouassi Yao").with_email("kyao@example.com"),
            Money::new(total, Currency::XOF),
        )
        .with_status(InvoiceStatus::Sent)
    }

    fn payment(amount: Decimal) -> NewPayment {
        NewPayment {
            amount,
            method: PaymentMethod::Wave,
            requested_type: None,
            reference: None,
            notes: None,
            paid_at: None,
            recorded_by: Recorder {
                user_id: "usr-manager".to_string(),
                name: "Adjoua".to_string(),
            },
        }
    }

    async fn service_with(invoice: Invoice) -> (PaymentLedgerService, Arc<MockInvoiceLedgerPort>) {
        let port = Arc::new(MockInvoiceLedgerPort::with_invoices(vec![invoice]).await);
        (PaymentLedgerService::new(port.clone()), port)
    }

    #[tokio::test]
    async fn test_deposit_then_final_then_delete() {
        let invoice = sent_invoice(dec!(100000));
        let id = invoice.id;
        let (service, port) = service_with(invoice).await;

        let first = service.add_payment(id, payment(dec!(40000))).await.unwrap();
        assert_eq!(first.payment.payment_type, PaymentType::Deposit);
        assert_eq!(first.invoice.status, InvoiceStatus::Partial);
        assert_eq!(first.invoice.amount_paid.amount(), dec!(40000));
        assert_eq!(first.invoice.remaining_balance.amount(), dec!(60000));
        assert!(!first.invoice.is_fully_paid);

        let second = service.add_payment(id, payment(dec!(60000))).await.unwrap();
        assert_eq!(second.payment.payment_type, PaymentType::Final);
        assert_eq!(second.invoice.status, InvoiceStatus::Paid);
        assert!(second.invoice.is_fully_paid);

        let stored = port.get_invoice(id).await.unwrap();
        assert!(stored.paid_date.is_some());
        assert_eq!(stored.version, 2);

        let reversal = service.delete_payment(id, second.payment.id).await.unwrap();
        assert_eq!(reversal.new_status, InvoiceStatus::Partial);
        assert_eq!(reversal.new_amount_paid.amount(), dec!(40000));

        let stored = port.get_invoice(id).await.unwrap();
        assert!(stored.paid_date.is_none());
        assert_eq!(port.receipt_count().await, 1);
    }

    #[tokio::test]
    async fn test_receipt_numbers_are_sequential() {
        let invoice = sent_invoice(dec!(300000));
        let id = invoice.id;
        let (service, _port) = service_with(invoice).await;

        let a = service.add_payment(id, payment(dec!(1000))).await.unwrap();
        let b = service.add_payment(id, payment(dec!(1000))).await.unwrap();

        let seq_a = a.receipt.receipt_number.sequence().unwrap();
        let seq_b = b.receipt.receipt_number.sequence().unwrap();
        assert_eq!(seq_b, seq_a + 1);
        assert_eq!(a.receipt.invoice_payment_id, a.payment.id);
        assert_eq!(b.payment.payment_type, PaymentType::Installment);
    }

    #[tokio::test]
    async fn test_paid_invoice_rejects_payment_without_changes() {
        let invoice = sent_invoice(dec!(10000)).with_status(InvoiceStatus::Paid);
        let id = invoice.id;
        let (service, port) = service_with(invoice).await;

        let result = service.add_payment(id, payment(dec!(500))).await;
        assert!(matches!(result, Err(BillingError::InvoiceNotPayable { .. })));
        assert_eq!(port.receipt_count().await, 0);
        assert_eq!(port.get_invoice(id).await.unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_unknown_invoice() {
        let (service, _port) = service_with(sent_invoice(dec!(1))).await;
        let result = service.list_payments(InvoiceId::new()).await;
        assert!(matches!(result, Err(BillingError::InvoiceNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_unknown_payment() {
        let invoice = sent_invoice(dec!(1000));
        let id = invoice.id;
        let (service, _port) = service_with(invoice).await;

        let result = service.delete_payment(id, PaymentId::new()).await;
        assert!(matches!(result, Err(BillingError::PaymentNotFound(_))));
    }

    #[tokio::test]
    async fn test_stale_plan_is_rejected_as_conflict() {
        let invoice = sent_invoice(dec!(100000));
        let snapshot = invoice.clone();
        let id = invoice.id;
        let (service, port) = service_with(invoice).await;

        // A plan computed from a snapshot that is then overtaken by another write
        let stale = PaymentLedger::plan_payment(&snapshot, 0, payment(dec!(5000)), Utc::now()).unwrap();
        service.add_payment(id, payment(dec!(5000))).await.unwrap();

        let result = port.record_payment(&stale).await;
        assert!(matches!(result, Err(PortError::Conflict { .. })));
        assert_eq!(port.receipt_count().await, 1);
        assert_eq!(port.get_invoice(id).await.unwrap().amount_paid.amount(), dec!(5000));
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_as_storage_error() {
        let invoice = sent_invoice(dec!(1000));
        let id = invoice.id;
        let (service, port) = service_with(invoice).await;
        assert!(service.storage_health().await.is_operational());
        port.set_unavailable(true);

        let result = service.add_payment(id, payment(dec!(100))).await;
        assert!(matches!(result, Err(BillingError::Storage(_))));
        assert!(!service.storage_health().await.is_operational());
    }

    #[tokio::test]
    async fn test_list_payments_newest_first() {
        let invoice = sent_invoice(dec!(100000));
        let id = invoice.id;
        let (service, _port) = service_with(invoice).await;

        let older = Utc::now() - chrono::Duration::days(3);
        let mut early = payment(dec!(1000));
        early.paid_at = Some(older);
        service.add_payment(id, early).await.unwrap();
        service.add_payment(id, payment(dec!(2000))).await.unwrap();

        let listing = service.list_payments(id).await.unwrap();
        assert_eq!(listing.payments.len(), 2);
        assert_eq!(listing.payments[0].amount.amount(), dec!(2000));
        assert_eq!(listing.summary.amount_paid.amount(), dec!(3000));
        assert_eq!(listing.summary.remaining_balance.amount(), dec!(97000));

        let receipts = service.list_receipts(id).await.unwrap();
        assert_eq!(receipts.len(), 2);
        assert!(receipts[0].payment_date > receipts[1].payment_date);
        let fetched = service.get_receipt(receipts[0].id).await.unwrap();
        assert_eq!(fetched, receipts[0]);
    }
}
