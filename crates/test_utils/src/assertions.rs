//! Custom Test Assertions
//!
//! Assertion helpers for ledger state that give more useful failure
//! messages than bare `assert_eq!`.

use core_kernel::Money;
use domain_billing::{Invoice, InvoicePayment, InvoiceStatus, Receipt};
use rust_decimal::Decimal;

/// Asserts that two Money values are equal in currency and amount
pub fn assert_money_eq(actual: &Money, expected: &Money) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );
    assert_eq!(
        actual.amount(),
        expected.amount(),
        "Amount mismatch: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts an invoice's paid amount and status
pub fn assert_invoice_state(invoice: &Invoice, amount_paid: Decimal, status: InvoiceStatus) {
    assert_eq!(
        invoice.amount_paid.amount(),
        amount_paid,
        "Invoice {} paid amount: actual={}, expected={}",
        invoice.invoice_number,
        invoice.amount_paid.amount(),
        amount_paid
    );
    assert_eq!(
        invoice.status, status,
        "Invoice {} status: actual={}, expected={}",
        invoice.invoice_number, invoice.status, status
    );
}

/// Asserts that `paid_date` is set exactly when the invoice is fully paid
pub fn assert_paid_date_consistent(invoice: &Invoice) {
    assert_eq!(
        invoice.paid_date.is_some(),
        invoice.is_fully_paid(),
        "Invoice {} paid_date={:?} but paid {} of {}",
        invoice.invoice_number,
        invoice.paid_date,
        invoice.amount_paid,
        invoice.total
    );
}

/// Asserts that a receipt documents exactly the given payment
pub fn assert_receipt_matches_payment(receipt: &Receipt, payment: &InvoicePayment) {
    assert_eq!(receipt.id, payment.receipt_id, "Payment points at another receipt");
    assert_eq!(receipt.invoice_payment_id, payment.id, "Receipt points at another payment");
    assert_eq!(receipt.invoice_id, payment.invoice_id, "Receipt and payment invoices differ");
    assert_money_eq(&receipt.amount, &payment.amount);
    assert_eq!(receipt.payment_method, payment.method);
    assert_eq!(receipt.payment_date, payment.paid_at);
}

/// Asserts that receipt numbers are strictly increasing in the given order
pub fn assert_receipt_numbers_increasing(receipts: &[Receipt]) {
    let sequences: Vec<i64> = receipts
        .iter()
        .map(|r| {
            r.receipt_number
                .sequence()
                .unwrap_or_else(|| panic!("Malformed receipt number {}", r.receipt_number))
        })
        .collect();

    for pair in sequences.windows(2) {
        assert!(
            pair[0] < pair[1],
            "Receipt sequence not increasing: {:?}",
            sequences
        );
    }
}
