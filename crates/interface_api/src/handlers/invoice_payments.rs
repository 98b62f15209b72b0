//! Invoice payment and receipt handlers
//!
//! Each handler checks the caller's role, then delegates to the
//! [`PaymentLedgerService`](domain_billing::PaymentLedgerService).

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use std::str::FromStr;

use core_kernel::{InvoiceId, PaymentId, ReceiptId};

use crate::auth::{permissions, require_role, Claims};
use crate::dto::invoice_payments::*;
use crate::{error::ApiError, AppState};

/// Malformed identifiers cannot match a stored row
fn parse_id<T: FromStr>(raw: &str, entity: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("{} not found", entity)))
}

/// Lists an invoice's payments with its summary
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ListPaymentsResponse>, ApiError> {
    require_role(&claims, permissions::LEDGER_READ)?;
    let invoice_id: InvoiceId = parse_id(&id, "Invoice")?;

    let listing = state.ledger.list_payments(invoice_id).await?;

    Ok(Json(ListPaymentsResponse {
        success: true,
        payments: listing.payments.into_iter().map(Into::into).collect(),
        summary: listing.summary.into(),
    }))
}

/// Records a payment and issues its receipt
pub async fn add_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    body: Result<Json<AddPaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddPaymentResponse>), ApiError> {
    require_role(&claims, permissions::PAYMENT_WRITE)?;
    let invoice_id: InvoiceId = parse_id(&id, "Invoice")?;
    let Json(request) = body?;

    let new_payment = request.into_new_payment(claims.recorder())?;
    let recorded = state.ledger.add_payment(invoice_id, new_payment).await?;

    let message = format!(
        "Payment of {} received by {}",
        recorded.payment.amount,
        recorded.payment.method.label()
    );

    Ok((
        StatusCode::CREATED,
        Json(AddPaymentResponse {
            success: true,
            payment: recorded.payment.into(),
            receipt: recorded.receipt.into(),
            invoice: recorded.invoice.into(),
            message,
        }),
    ))
}

/// Deletes a payment and its receipt
pub async fn delete_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    query: Result<Query<DeletePaymentQuery>, QueryRejection>,
) -> Result<Json<DeletePaymentResponse>, ApiError> {
    require_role(&claims, permissions::PAYMENT_DELETE)?;
    let invoice_id: InvoiceId = parse_id(&id, "Invoice")?;
    let Query(query) = query?;

    let raw_payment_id = query
        .payment_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Payment ID is required".to_string()))?;
    let payment_id: PaymentId = parse_id(raw_payment_id.trim(), "Payment")?;

    let reversal = state.ledger.delete_payment(invoice_id, payment_id).await?;

    Ok(Json(DeletePaymentResponse {
        success: true,
        message: format!("Payment of {} deleted", reversal.payment.amount),
        new_amount_paid: reversal.new_amount_paid.amount(),
        new_status: reversal.new_status,
    }))
}

/// Lists the receipts issued for an invoice
pub async fn list_receipts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ListReceiptsResponse>, ApiError> {
    require_role(&claims, permissions::LEDGER_READ)?;
    let invoice_id: InvoiceId = parse_id(&id, "Invoice")?;

    let receipts = state.ledger.list_receipts(invoice_id).await?;

    Ok(Json(ListReceiptsResponse {
        success: true,
        receipts: receipts.into_iter().map(Into::into).collect(),
    }))
}

/// Gets a receipt by ID
pub async fn get_receipt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<GetReceiptResponse>, ApiError> {
    require_role(&claims, permissions::LEDGER_READ)?;
    let receipt_id: ReceiptId = parse_id(&id, "Receipt")?;

    let receipt = state.ledger.get_receipt(receipt_id).await?;

    Ok(Json(GetReceiptResponse {
        success: true,
        receipt: receipt.into(),
    }))
}
