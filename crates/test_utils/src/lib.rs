//! Test Utilities Crate
//!
//! Shared test infrastructure for the billing workspace.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common entities
//! - `builders`: Builder patterns for invoices and payment requests
//! - `database`: PostgreSQL test containers with the schema applied
//! - `assertions`: Assertion helpers for ledger state

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
