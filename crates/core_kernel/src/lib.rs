//! Core Kernel - Foundational types shared by the billing workspace
//!
//! This crate provides the building blocks used across the domain and
//! infrastructure crates:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers
//! - Port infrastructure for swappable storage adapters

pub mod money;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{InvoiceId, PaymentId, ReceiptId};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
pub use error::CoreError;
