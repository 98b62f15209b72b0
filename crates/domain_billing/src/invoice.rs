//! Invoice model and status lifecycle
//!
//! Invoices are created and edited by the back office; this crate only
//! tracks how payments move them through their payment lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CoreError, Currency, InvoiceId, Money};

use crate::ledger::InvoiceUpdate;

/// Invoice status
///
/// ```text
/// DRAFT/SENT/OVERDUE ──pay──▶ PARTIAL ──pay──▶ PAID
///        ▲                      │  ▲             │
///        └──────delete──────────┘  └───delete────┘
/// ```
///
/// CANCELLED and REFUNDED accept no further payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Invoice is being drafted
    Draft,
    /// Invoice has been sent to the customer
    Sent,
    /// Some, but not all, of the total has been paid
    Partial,
    /// Fully paid
    Paid,
    /// Past due date
    Overdue,
    /// Cancelled/voided
    Cancelled,
    /// Refunded to the customer
    Refunded,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 7] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Partial,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
        InvoiceStatus::Cancelled,
        InvoiceStatus::Refunded,
    ];

    /// Wire-level name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::Partial => "PARTIAL",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
            InvoiceStatus::Cancelled => "CANCELLED",
            InvoiceStatus::Refunded => "REFUNDED",
        }
    }

    /// Whether new payments may be recorded against an invoice in this status
    pub fn accepts_payments(&self) -> bool {
        !matches!(
            self,
            InvoiceStatus::Paid | InvoiceStatus::Cancelled | InvoiceStatus::Refunded
        )
    }

    /// Terminal with respect to the payment ledger
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Cancelled | InvoiceStatus::Refunded)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::unknown_value("invoice status", s))
    }
}

/// Customer contact details carried on the invoice and copied onto receipts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerContact {
    /// Creates a contact with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            phone: None,
            address: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// A customer invoice tracked through its payment lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Invoice number (human-readable)
    pub invoice_number: String,
    /// Billed customer
    pub customer: CustomerContact,
    /// Total amount due
    pub total: Money,
    /// Running sum of recorded payments
    pub amount_paid: Money,
    /// Status
    pub status: InvoiceStatus,
    /// Payment due date
    pub due_date: Option<NaiveDate>,
    /// When the invoice became fully paid
    pub paid_date: Option<DateTime<Utc>>,
    /// Optimistic concurrency version, bumped on every ledger write
    pub version: i64,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates a new draft invoice with nothing paid
    ///
    /// # Arguments
    ///
    /// * `invoice_number` - Human-readable number
    /// * `customer` - Billed customer
    /// * `total` - Total amount due; its currency is the invoice currency
    pub fn new(invoice_number: impl Into<String>, customer: CustomerContact, total: Money) -> Self {
        let now = Utc::now();

        Self {
            id: InvoiceId::new_v7(),
            invoice_number: invoice_number.into(),
            customer,
            total,
            amount_paid: Money::zero(total.currency()),
            status: InvoiceStatus::Draft,
            due_date: None,
            paid_date: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the status
    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the due date
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Invoice currency
    pub fn currency(&self) -> Currency {
        self.total.currency()
    }

    /// `total - amount_paid`; negative when the invoice was overpaid
    pub fn remaining_balance(&self) -> Money {
        Money::new(self.total.amount() - self.amount_paid.amount(), self.currency())
    }

    /// Returns true once payments cover the total
    pub fn is_fully_paid(&self) -> bool {
        self.amount_paid.amount() >= self.total.amount()
    }

    /// Checks if the invoice is past due and still expecting money
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => today > due && self.status.accepts_payments(),
            None => false,
        }
    }

    /// Applies a ledger update, advancing the version
    pub fn apply_update(&mut self, update: &InvoiceUpdate) {
        self.amount_paid = update.amount_paid;
        self.status = update.status;
        self.paid_date = update.paid_date;
        self.updated_at = update.updated_at;
        self.version = update.expected_version + 1;
    }
}
