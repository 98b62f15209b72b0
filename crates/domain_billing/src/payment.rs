//! Invoice payments
//!
//! One `InvoicePayment` is a single money movement applied against an
//! invoice balance. Its `PaymentType` is derived by the ledger, never taken
//! verbatim when the payment settles the invoice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CoreError, InvoiceId, Money, PaymentId, ReceiptId};

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Check,
    OrangeMoney,
    MtnMobileMoney,
    MoovMoney,
    Wave,
    #[serde(rename = "PAIEMENTPRO")]
    PaiementPro,
    Card,
    #[serde(rename = "PAYPAL")]
    PayPal,
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 11] = [
        PaymentMethod::Cash,
        PaymentMethod::BankTransfer,
        PaymentMethod::Check,
        PaymentMethod::OrangeMoney,
        PaymentMethod::MtnMobileMoney,
        PaymentMethod::MoovMoney,
        PaymentMethod::Wave,
        PaymentMethod::PaiementPro,
        PaymentMethod::Card,
        PaymentMethod::PayPal,
        PaymentMethod::Other,
    ];

    /// Wire-level name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Check => "CHECK",
            PaymentMethod::OrangeMoney => "ORANGE_MONEY",
            PaymentMethod::MtnMobileMoney => "MTN_MOBILE_MONEY",
            PaymentMethod::MoovMoney => "MOOV_MONEY",
            PaymentMethod::Wave => "WAVE",
            PaymentMethod::PaiementPro => "PAIEMENTPRO",
            PaymentMethod::Card => "CARD",
            PaymentMethod::PayPal => "PAYPAL",
            PaymentMethod::Other => "OTHER",
        }
    }

    /// Label printed on receipts
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::BankTransfer => "Bank transfer",
            PaymentMethod::Check => "Check",
            PaymentMethod::OrangeMoney => "Orange Money",
            PaymentMethod::MtnMobileMoney => "MTN Mobile Money",
            PaymentMethod::MoovMoney => "Moov Money",
            PaymentMethod::Wave => "Wave",
            PaymentMethod::PaiementPro => "PaiementPro",
            PaymentMethod::Card => "Card",
            PaymentMethod::PayPal => "PayPal",
            PaymentMethod::Other => "Other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| CoreError::unknown_value("payment method", s))
    }
}

/// Role of a payment in the invoice's payoff sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    /// First payment on an invoice
    Deposit,
    /// Any later payment that leaves a balance
    Installment,
    /// The payment that settles the invoice
    Final,
}

impl PaymentType {
    pub const ALL: [PaymentType; 3] = [
        PaymentType::Deposit,
        PaymentType::Installment,
        PaymentType::Final,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Deposit => "DEPOSIT",
            PaymentType::Installment => "INSTALLMENT",
            PaymentType::Final => "FINAL",
        }
    }

    /// Derives the type of a new payment
    ///
    /// FINAL wins whenever the payment settles the invoice; otherwise the
    /// caller's choice is kept, falling back to DEPOSIT for the first
    /// payment and INSTALLMENT afterwards.
    pub fn classify(
        settles_invoice: bool,
        requested: Option<PaymentType>,
        prior_payments: u64,
    ) -> PaymentType {
        if settles_invoice {
            return PaymentType::Final;
        }
        match requested {
            Some(requested) => requested,
            None if prior_payments == 0 => PaymentType::Deposit,
            None => PaymentType::Installment,
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::unknown_value("payment type", s))
    }
}

/// Back-office user recording a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recorder {
    /// User identifier from the session
    pub user_id: String,
    /// Display name printed on the receipt
    pub name: String,
}

/// A payment to be recorded against an invoice, as requested by a user
#[derive(Debug, Clone)]
pub struct NewPayment {
    /// Amount in the invoice currency
    pub amount: rust_decimal::Decimal,
    pub method: PaymentMethod,
    pub requested_type: Option<PaymentType>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    /// Defaults to the time of recording
    pub paid_at: Option<DateTime<Utc>>,
    pub recorded_by: Recorder,
}

/// A recorded invoice payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicePayment {
    /// Unique identifier
    pub id: PaymentId,
    /// Invoice being paid
    pub invoice_id: InvoiceId,
    /// Payment amount
    pub amount: Money,
    /// Payment method
    pub method: PaymentMethod,
    /// Derived payment type
    pub payment_type: PaymentType,
    /// External reference (bank ref, mobile-money transaction ID)
    pub reference: Option<String>,
    /// When the customer paid
    pub paid_at: DateTime<Utc>,
    /// Notes
    pub notes: Option<String>,
    /// User who recorded the payment
    pub created_by: Option<String>,
    /// Receipt issued for this payment
    pub receipt_id: ReceiptId,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_wire_names() {
        let json = serde_json::to_string(&PaymentMethod::PaiementPro).unwrap();
        assert_eq!(json, "\"PAIEMENTPRO\"");
        let json = serde_json::to_string(&PaymentMethod::MtnMobileMoney).unwrap();
        assert_eq!(json, "\"MTN_MOBILE_MONEY\"");

        for method in PaymentMethod::ALL {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_unknown_payment_method_is_rejected() {
        let err = "BITCOIN".parse::<PaymentMethod>().unwrap_err();
        assert!(err.to_string().contains("Invalid payment method"));
        assert!("cash".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_classify_final_overrides_request() {
        let kind = PaymentType::classify(true, Some(PaymentType::Deposit), 0);
        assert_eq!(kind, PaymentType::Final);
    }

    #[test]
    fn test_classify_defaults() {
        assert_eq!(PaymentType::classify(false, None, 0), PaymentType::Deposit);
        assert_eq!(PaymentType::classify(false, None, 1), PaymentType::Installment);
        assert_eq!(
            PaymentType::classify(false, Some(PaymentType::Deposit), 3),
            PaymentType::Deposit
        );
    }
}
