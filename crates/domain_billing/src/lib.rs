//! Billing Domain - Invoice Payment Ledger
//!
//! This crate records partial and installment payments against customer
//! invoices, keeps each invoice's paid-to-date amount and status in step,
//! and issues one sequentially numbered receipt per payment.
//!
//! # Payment lifecycle
//!
//! - The first payment on an invoice is a **DEPOSIT** unless the caller says otherwise
//! - Later payments that leave a balance are **INSTALLMENT**s
//! - The payment that covers the total is always **FINAL** and marks the invoice PAID
//! - Deleting a payment reverses it and recomputes the status
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{PaymentLedgerService, NewPayment, PaymentMethod};
//!
//! let service = PaymentLedgerService::new(port);
//! let recorded = service.add_payment(invoice_id, request).await?;
//! println!("{}", recorded.receipt.receipt_number);
//! ```

pub mod invoice;
pub mod payment;
pub mod receipt;
pub mod ledger;
pub mod ports;
pub mod service;
pub mod error;

pub use invoice::{Invoice, InvoiceStatus, CustomerContact};
pub use payment::{InvoicePayment, NewPayment, PaymentMethod, PaymentType, Recorder};
pub use receipt::{Receipt, ReceiptDraft, ReceiptNumber};
pub use ledger::{PaymentLedger, PaymentPlan, ReversalPlan, InvoiceUpdate, PaymentSummary};
pub use ports::InvoiceLedgerPort;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockInvoiceLedgerPort;
pub use service::{
    PaymentLedgerService, RecordedPayment, PaymentListing, PaymentReversal, InvoicePaymentState,
};
pub use error::BillingError;
