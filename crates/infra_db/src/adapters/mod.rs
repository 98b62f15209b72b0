//! Domain Adapters
//!
//! Adapter implementations connecting domain ports to PostgreSQL.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresBillingAdapter;
//! use domain_billing::InvoiceLedgerPort;
//!
//! let adapter = PostgresBillingAdapter::new(pool);
//! let invoice = adapter.get_invoice(invoice_id).await?;
//! ```

pub mod billing;

pub use billing::PostgresBillingAdapter;
