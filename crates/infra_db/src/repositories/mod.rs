//! Repository implementations
//!
//! Repositories own the SQL and map between database rows and plain row
//! structs; adapters translate those rows into domain types.

pub mod billing;

pub use billing::BillingRepository;
