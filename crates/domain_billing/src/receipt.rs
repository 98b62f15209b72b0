//! Payment receipts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{InvoiceId, Money, PaymentId, ReceiptId};

use crate::payment::PaymentMethod;

/// Sequential receipt number, formatted `REC-<year>-<sequence>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptNumber(String);

impl ReceiptNumber {
    const PREFIX: &'static str = "REC";

    /// Formats a number from the year of issue and the global sequence value
    pub fn from_sequence(year: i32, sequence: i64) -> Self {
        Self(format!("{}-{}-{:06}", Self::PREFIX, year, sequence))
    }

    /// Wraps a stored receipt number
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sequence component, if the number is well formed
    pub fn sequence(&self) -> Option<i64> {
        let mut parts = self.0.splitn(3, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(Self::PREFIX), Some(_year), Some(seq)) => seq.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for ReceiptNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Customer-facing proof of one payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub receipt_number: ReceiptNumber,
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub invoice_payment_id: PaymentId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub payment_date: DateTime<Utc>,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
}

/// A receipt waiting for its number
///
/// Numbers are drawn by the storage adapter inside the transaction that
/// persists the payment, so the draft carries everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptDraft {
    pub id: ReceiptId,
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub invoice_payment_id: PaymentId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub payment_date: DateTime<Utc>,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
}

impl ReceiptDraft {
    /// Issues the receipt under the given number
    pub fn issue(self, receipt_number: ReceiptNumber) -> Receipt {
        Receipt {
            id: self.id,
            receipt_number,
            invoice_id: self.invoice_id,
            invoice_number: self.invoice_number,
            invoice_payment_id: self.invoice_payment_id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            amount: self.amount,
            payment_method: self.payment_method,
            payment_date: self.payment_date,
            created_by_name: self.created_by_name,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_number_format() {
        let number = ReceiptNumber::from_sequence(2026, 42);
        assert_eq!(number.as_str(), "REC-2026-000042");
        assert_eq!(number.sequence(), Some(42));
    }

    #[test]
    fn test_receipt_numbers_sort_by_sequence_within_a_year() {
        let first = ReceiptNumber::from_sequence(2026, 9);
        let second = ReceiptNumber::from_sequence(2026, 10);
        assert!(first < second);
    }

    #[test]
    fn test_malformed_number_has_no_sequence() {
        assert_eq!(ReceiptNumber::from_string("RCPT-1").sequence(), None);
    }
}
