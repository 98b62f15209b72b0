//! HTTP API Layer
//!
//! This crate exposes the invoice payment ledger to the back office using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Payments, receipts and health endpoints
//! - **Middleware**: Bearer-token authentication, tracing, audit logging
//! - **DTOs**: camelCase request/response bodies
//! - **Error Handling**: `{ success: false, error, message }` responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(ledger, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware as axum_middleware,
};
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use domain_billing::PaymentLedgerService;

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, audit_middleware};
use crate::handlers::{health, invoice_payments};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<PaymentLedgerService>,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `ledger` - Payment ledger service over the configured storage port
/// * `config` - API configuration
pub fn create_router(ledger: PaymentLedgerService, config: ApiConfig) -> Router {
    let state = AppState {
        ledger: Arc::new(ledger),
        config,
    };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let invoice_routes = Router::new()
        .route(
            "/:id/payments",
            get(invoice_payments::list_payments)
                .post(invoice_payments::add_payment)
                .delete(invoice_payments::delete_payment),
        )
        .route("/:id/receipts", get(invoice_payments::list_receipts));

    let receipt_routes = Router::new().route("/:id", get(invoice_payments::get_receipt));

    // Protected back-office routes
    let admin_routes = Router::new()
        .nest("/invoices", invoice_routes)
        .nest("/receipts", receipt_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
