//! API error handling

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use domain_billing::BillingError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing/invalid token or insufficient role
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed input or a business rule rejected the request
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Identifiers in the request do not belong together
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// The invoice changed while the request was being applied
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Anything else; the message is logged, never returned
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "AuthorizationError"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFoundError"),
            ApiError::Integrity(_) => (StatusCode::BAD_REQUEST, "IntegrityError"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "ConflictError"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UnexpectedError"),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        let message = match self {
            ApiError::Internal(detail) => {
                error!(error = %detail, "Unexpected error while handling request");
                "An unexpected error occurred".to_string()
            }
            ApiError::Unauthorized(msg)
            | ApiError::Validation(msg)
            | ApiError::NotFound(msg)
            | ApiError::Integrity(msg)
            | ApiError::Conflict(msg) => msg,
        };

        let body = ErrorResponse {
            success: false,
            error: kind.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::InvoiceNotFound(_) => ApiError::NotFound("Invoice not found".to_string()),
            BillingError::PaymentNotFound(_) => ApiError::NotFound("Payment not found".to_string()),
            BillingError::ReceiptNotFound(_) => ApiError::NotFound("Receipt not found".to_string()),
            BillingError::InvalidAmount(msg) => ApiError::Validation(msg),
            BillingError::InvoiceNotPayable { status, .. } => ApiError::Validation(format!(
                "Cannot add payment to an invoice with status {}",
                status
            )),
            BillingError::PaymentInvoiceMismatch { .. } => {
                ApiError::Integrity("Payment does not belong to this invoice".to_string())
            }
            BillingError::ConcurrentModification(_) => ApiError::Conflict(
                "The invoice was modified by another request; reload and try again".to_string(),
            ),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    /// Keeps only the first message, sorted by field name for stable output
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .iter()
            .find_map(|(field, errs)| {
                errs.first().map(|e| match &e.message {
                    Some(m) => m.to_string(),
                    None => format!("Invalid value for {}", field),
                })
            })
            .unwrap_or_else(|| "Invalid request".to_string());

        ApiError::Validation(message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
