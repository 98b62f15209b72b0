//! Invoice payment and receipt DTOs
//!
//! Bodies are camelCase; amounts travel as JSON numbers in the invoice
//! currency.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use core_kernel::{InvoiceId, PaymentId, ReceiptId};
use domain_billing::{
    InvoicePayment, InvoicePaymentState, InvoiceStatus, NewPayment, PaymentMethod, PaymentSummary,
    PaymentType, Receipt, Recorder,
};

use crate::error::ApiError;

fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_positive() && !amount.is_zero() {
        return Ok(());
    }
    let mut error = ValidationError::new("positive_amount");
    error.message = Some("Amount must be greater than zero".into());
    Err(error)
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddPaymentRequest {
    #[serde(with = "rust_decimal::serde::float")]
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    pub payment_method: String,
    pub payment_type: Option<String>,
    #[validate(length(max = 255, message = "Reference must be at most 255 characters"))]
    pub reference: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub paid_at: Option<String>,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

impl AddPaymentRequest {
    /// Validates the body and converts it into a ledger request
    pub fn into_new_payment(self, recorded_by: Recorder) -> Result<NewPayment, ApiError> {
        self.validate()?;

        let method: PaymentMethod = self
            .payment_method
            .parse()
            .map_err(|e: core_kernel::CoreError| ApiError::Validation(e.to_string()))?;

        let requested_type = self
            .payment_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<PaymentType>)
            .transpose()
            .map_err(|e| ApiError::Validation(e.to_string()))?;

        let paid_at = self
            .paid_at
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(parse_paid_at)
            .transpose()?;

        Ok(NewPayment {
            amount: self.amount,
            method,
            requested_type,
            reference: non_blank(self.reference),
            notes: non_blank(self.notes),
            paid_at,
            recorded_by,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Accepts a full timestamp or a calendar date taken as midnight UTC
fn parse_paid_at(value: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ApiError::Validation(format!("Invalid payment date: {}", value)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePaymentQuery {
    pub payment_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: PaymentId,
    pub invoice_id: InvoiceId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    pub reference: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub receipt_id: ReceiptId,
    pub created_at: DateTime<Utc>,
}

impl From<InvoicePayment> for PaymentResponse {
    fn from(payment: InvoicePayment) -> Self {
        Self {
            id: payment.id,
            invoice_id: payment.invoice_id,
            amount: payment.amount.amount(),
            currency: payment.amount.currency().code().to_string(),
            payment_method: payment.method,
            payment_type: payment.payment_type,
            reference: payment.reference,
            paid_at: payment.paid_at,
            notes: payment.notes,
            created_by: payment.created_by,
            receipt_id: payment.receipt_id,
            created_at: payment.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub id: ReceiptId,
    pub receipt_number: String,
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub invoice_payment_id: PaymentId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_method_label: String,
    pub payment_date: DateTime<Utc>,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Receipt> for ReceiptResponse {
    fn from(receipt: Receipt) -> Self {
        Self {
            id: receipt.id,
            receipt_number: receipt.receipt_number.as_str().to_string(),
            invoice_id: receipt.invoice_id,
            invoice_number: receipt.invoice_number,
            invoice_payment_id: receipt.invoice_payment_id,
            customer_name: receipt.customer_name,
            customer_email: receipt.customer_email,
            customer_phone: receipt.customer_phone,
            amount: receipt.amount.amount(),
            currency: receipt.amount.currency().code().to_string(),
            payment_method: receipt.payment_method,
            payment_method_label: receipt.payment_method.label().to_string(),
            payment_date: receipt.payment_date,
            created_by_name: receipt.created_by_name,
            created_at: receipt.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummaryResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_paid: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_balance: Decimal,
    pub currency: String,
}

impl From<PaymentSummary> for PaymentSummaryResponse {
    fn from(summary: PaymentSummary) -> Self {
        Self {
            total: summary.total.amount(),
            amount_paid: summary.amount_paid.amount(),
            remaining_balance: summary.remaining_balance.amount(),
            currency: summary.total.currency().code().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStateResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_paid: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_balance: Decimal,
    pub status: InvoiceStatus,
    pub is_fully_paid: bool,
}

impl From<InvoicePaymentState> for InvoiceStateResponse {
    fn from(state: InvoicePaymentState) -> Self {
        Self {
            amount_paid: state.amount_paid.amount(),
            remaining_balance: state.remaining_balance.amount(),
            status: state.status,
            is_fully_paid: state.is_fully_paid,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPaymentsResponse {
    pub success: bool,
    pub payments: Vec<PaymentResponse>,
    pub summary: PaymentSummaryResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPaymentResponse {
    pub success: bool,
    pub payment: PaymentResponse,
    pub receipt: ReceiptResponse,
    pub invoice: InvoiceStateResponse,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePaymentResponse {
    pub success: bool,
    pub message: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub new_amount_paid: Decimal,
    pub new_status: InvoiceStatus,
}

#[derive(Debug, Serialize)]
pub struct ListReceiptsResponse {
    pub success: bool,
    pub receipts: Vec<ReceiptResponse>,
}

#[derive(Debug, Serialize)]
pub struct GetReceiptResponse {
    pub success: bool,
    pub receipt: ReceiptResponse,
}
