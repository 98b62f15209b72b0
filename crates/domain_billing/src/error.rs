//! Billing domain errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError};

use crate::invoice::InvoiceStatus;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Invoice not found
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Payment not found
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Receipt not found
    #[error("Receipt not found: {0}")]
    ReceiptNotFound(String),

    /// Amount is zero, negative, or otherwise unusable
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Invoice status does not accept payments
    #[error("Invoice {invoice_number} is {status} and cannot receive payments")]
    InvoiceNotPayable {
        invoice_number: String,
        status: InvoiceStatus,
    },

    /// Payment exists but belongs to a different invoice
    #[error("Payment {payment_id} does not belong to invoice {invoice_id}")]
    PaymentInvoiceMismatch {
        payment_id: String,
        invoice_id: String,
    },

    /// Invoice changed between read and write
    #[error("Invoice was modified concurrently: {0}")]
    ConcurrentModification(String),

    /// Money arithmetic failed
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Storage adapter failure
    #[error("Storage error: {0}")]
    Storage(PortError),
}

impl From<PortError> for BillingError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::Conflict { message } => BillingError::ConcurrentModification(message),
            other => BillingError::Storage(other),
        }
    }
}
