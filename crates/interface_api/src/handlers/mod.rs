//! Request handlers

pub mod health;
pub mod invoice_payments;
