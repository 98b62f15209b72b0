//! Invoice payment ledger rules
//!
//! The functions here are pure: they read an invoice snapshot and produce a
//! plan describing every row that must change. Storage adapters apply a
//! plan in one transaction, guarded by the invoice version the plan was
//! computed from.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{PaymentLedger, NewPayment};
//!
//! let plan = PaymentLedger::plan_payment(&invoice, prior_payments, request, Utc::now())?;
//! let receipt = port.record_payment(&plan).await?;
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, Money, PaymentId, ReceiptId};

use crate::error::BillingError;
use crate::invoice::{Invoice, InvoiceStatus};
use crate::payment::{InvoicePayment, NewPayment, PaymentType};
use crate::receipt::ReceiptDraft;

/// New values for an invoice after a ledger write
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceUpdate {
    pub invoice_id: InvoiceId,
    /// Version the plan was computed from; the write fails if it moved
    pub expected_version: i64,
    pub amount_paid: Money,
    pub status: InvoiceStatus,
    pub paid_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Everything that changes when a payment is recorded
#[derive(Debug, Clone)]
pub struct PaymentPlan {
    pub payment: InvoicePayment,
    pub receipt: ReceiptDraft,
    pub invoice: InvoiceUpdate,
    pub is_fully_paid: bool,
    /// Amount paid beyond the remaining balance, if any
    pub overpayment: Option<Money>,
}

/// Everything that changes when a payment is deleted
#[derive(Debug, Clone)]
pub struct ReversalPlan {
    pub payment: InvoicePayment,
    pub invoice: InvoiceUpdate,
}

/// Paid-to-date summary of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub total: Money,
    pub amount_paid: Money,
    pub remaining_balance: Money,
}

impl PaymentSummary {
    pub fn of(invoice: &Invoice) -> Self {
        Self {
            total: invoice.total,
            amount_paid: invoice.amount_paid,
            remaining_balance: invoice.remaining_balance(),
        }
    }
}

/// Invoice payment ledger rules
pub struct PaymentLedger;

impl PaymentLedger {
    /// Plans recording a payment against an invoice
    ///
    /// # Arguments
    ///
    /// * `invoice` - Current invoice snapshot
    /// * `prior_payments` - Number of payments already recorded on the invoice
    /// * `request` - The payment being recorded
    /// * `now` - Recording time
    ///
    /// # Errors
    ///
    /// * `BillingError::InvalidAmount` if the amount is not strictly positive
    ///   or is finer than the invoice currency's minor unit
    /// * `BillingError::InvoiceNotPayable` if the invoice is PAID, CANCELLED or REFUNDED
    pub fn plan_payment(
        invoice: &Invoice,
        prior_payments: u64,
        request: NewPayment,
        now: DateTime<Utc>,
    ) -> Result<PaymentPlan, BillingError> {
        if request.amount <= Decimal::ZERO {
            return Err(BillingError::InvalidAmount(
                "Payment amount must be greater than zero".to_string(),
            ));
        }
        if !invoice.status.accepts_payments() {
            return Err(BillingError::InvoiceNotPayable {
                invoice_number: invoice.invoice_number.clone(),
                status: invoice.status,
            });
        }

        let currency = invoice.currency();
        let amount = Money::exact(request.amount, currency)
            .map_err(|e| BillingError::InvalidAmount(e.to_string()))?;
        let remaining = invoice.remaining_balance();

        // Overpayment is accepted; the caller decides whether to log it.
        let overpayment = amount
            .checked_sub(&remaining)
            .ok()
            .filter(|excess| excess.is_positive());

        let new_amount_paid = invoice.amount_paid.checked_add(&amount)?;
        let is_fully_paid = new_amount_paid.amount() >= invoice.total.amount();
        let status = Self::status_after_payment(invoice.status, new_amount_paid, is_fully_paid);
        let payment_type = PaymentType::classify(is_fully_paid, request.requested_type, prior_payments);
        let paid_at = request.paid_at.unwrap_or(now);

        let payment = InvoicePayment {
            id: PaymentId::new_v7(),
            invoice_id: invoice.id,
            amount,
            method: request.method,
            payment_type,
            reference: request.reference,
            paid_at,
            notes: request.notes,
            created_by: Some(request.recorded_by.user_id),
            receipt_id: ReceiptId::new_v7(),
            created_at: now,
        };

        let receipt = ReceiptDraft {
            id: payment.receipt_id,
            invoice_id: invoice.id,
            invoice_number: invoice.invoice_number.clone(),
            invoice_payment_id: payment.id,
            customer_name: invoice.customer.name.clone(),
            customer_email: invoice.customer.email.clone(),
            customer_phone: invoice.customer.phone.clone(),
            amount,
            payment_method: payment.method,
            payment_date: paid_at,
            created_by_name: request.recorded_by.name,
            created_at: now,
        };

        let paid_date = if is_fully_paid { Some(now) } else { invoice.paid_date };

        Ok(PaymentPlan {
            payment,
            receipt,
            invoice: InvoiceUpdate {
                invoice_id: invoice.id,
                expected_version: invoice.version,
                amount_paid: new_amount_paid,
                status,
                paid_date,
                updated_at: now,
            },
            is_fully_paid,
            overpayment,
        })
    }

    /// Plans deleting a payment and reversing its effect on the invoice
    ///
    /// # Errors
    ///
    /// Returns `BillingError::PaymentInvoiceMismatch` if the payment was
    /// recorded against another invoice.
    pub fn plan_reversal(
        invoice: &Invoice,
        payment: InvoicePayment,
        now: DateTime<Utc>,
    ) -> Result<ReversalPlan, BillingError> {
        if payment.invoice_id != invoice.id {
            return Err(BillingError::PaymentInvoiceMismatch {
                payment_id: payment.id.to_string(),
                invoice_id: invoice.id.to_string(),
            });
        }

        let new_amount_paid = invoice.amount_paid.checked_sub(&payment.amount)?.floor_at_zero();
        let still_fully_paid = new_amount_paid.amount() >= invoice.total.amount();
        let status = Self::status_after_reversal(invoice.status, new_amount_paid, invoice.total);
        let paid_date = if still_fully_paid { invoice.paid_date } else { None };

        Ok(ReversalPlan {
            payment,
            invoice: InvoiceUpdate {
                invoice_id: invoice.id,
                expected_version: invoice.version,
                amount_paid: new_amount_paid,
                status,
                paid_date,
                updated_at: now,
            },
        })
    }

    /// Status after a payment raised the paid amount
    pub fn status_after_payment(
        current: InvoiceStatus,
        new_amount_paid: Money,
        is_fully_paid: bool,
    ) -> InvoiceStatus {
        if is_fully_paid {
            InvoiceStatus::Paid
        } else if new_amount_paid.is_positive() {
            InvoiceStatus::Partial
        } else {
            current
        }
    }

    /// Status after a payment was removed
    pub fn status_after_reversal(
        current: InvoiceStatus,
        new_amount_paid: Money,
        total: Money,
    ) -> InvoiceStatus {
        if !new_amount_paid.is_positive() {
            InvoiceStatus::Sent
        } else if new_amount_paid.amount() < total.amount() {
            InvoiceStatus::Partial
        } else {
            current
        }
    }
}
