//! Test Data Builders
//!
//! Builders for invoices and payment requests with sensible defaults, so
//! tests only spell out the fields they care about.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{Currency, Money};
use domain_billing::{
    CustomerContact, Invoice, InvoiceStatus, MockInvoiceLedgerPort, NewPayment, PaymentLedgerService,
    PaymentMethod, PaymentType, Recorder,
};
use rust_decimal::Decimal;

use crate::fixtures::{ContactFixtures, MoneyFixtures, StringFixtures};

/// Builder for invoices
pub struct TestInvoiceBuilder {
    invoice_number: String,
    customer: CustomerContact,
    total: Money,
    amount_paid: Option<Decimal>,
    status: InvoiceStatus,
    due_date: Option<NaiveDate>,
}

impl Default for TestInvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestInvoiceBuilder {
    /// A SENT invoice for 100,000 XOF with nothing paid
    pub fn new() -> Self {
        Self {
            invoice_number: StringFixtures::invoice_number().to_string(),
            customer: ContactFixtures::customer(),
            total: MoneyFixtures::xof_100_000(),
            amount_paid: None,
            status: InvoiceStatus::Sent,
            due_date: None,
        }
    }

    pub fn with_invoice_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = number.into();
        self
    }

    pub fn with_customer(mut self, customer: CustomerContact) -> Self {
        self.customer = customer;
        self
    }

    /// Sets the total; the paid amount follows its currency
    pub fn with_total(mut self, amount: Decimal, currency: Currency) -> Self {
        self.total = Money::new(amount, currency);
        self
    }

    /// Sets the amount already paid, in the invoice currency
    pub fn with_amount_paid(mut self, amount: Decimal) -> Self {
        self.amount_paid = Some(amount);
        self
    }

    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn build(self) -> Invoice {
        let mut invoice =
            Invoice::new(self.invoice_number, self.customer, self.total).with_status(self.status);
        if let Some(paid) = self.amount_paid {
            invoice.amount_paid = Money::new(paid, invoice.currency());
        }
        invoice.due_date = self.due_date;
        invoice
    }
}

/// Builder for payment requests
pub struct TestPaymentRequestBuilder {
    amount: Decimal,
    method: PaymentMethod,
    requested_type: Option<PaymentType>,
    reference: Option<String>,
    notes: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    recorded_by: Recorder,
}

impl TestPaymentRequestBuilder {
    /// A cash payment of `amount` recorded by the test manager
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount,
            method: PaymentMethod::Cash,
            requested_type: None,
            reference: None,
            notes: None,
            paid_at: None,
            recorded_by: ContactFixtures::manager(),
        }
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_type(mut self, payment_type: PaymentType) -> Self {
        self.requested_type = Some(payment_type);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn paid_at(mut self, paid_at: DateTime<Utc>) -> Self {
        self.paid_at = Some(paid_at);
        self
    }

    pub fn build(self) -> NewPayment {
        NewPayment {
            amount: self.amount,
            method: self.method,
            requested_type: self.requested_type,
            reference: self.reference,
            notes: self.notes,
            paid_at: self.paid_at,
            recorded_by: self.recorded_by,
        }
    }
}

/// Builds a ledger service over an in-memory port seeded with `invoices`
pub async fn mock_ledger_service(
    invoices: Vec<Invoice>,
) -> (PaymentLedgerService, Arc<MockInvoiceLedgerPort>) {
    let port = Arc::new(MockInvoiceLedgerPort::with_invoices(invoices).await);
    (PaymentLedgerService::new(port.clone()), port)
}
