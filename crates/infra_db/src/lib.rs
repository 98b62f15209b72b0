//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the invoice payment ledger using SQLx.
//!
//! # Architecture
//!
//! - `repositories` hold the SQL and row types
//! - `adapters` implement the domain ports on top of the repositories
//! - `pool` builds the connection pool and applies the migrations
//!
//! Every ledger write is one transaction guarded by the invoice's
//! `version` column.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresBillingAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/atelier_billing")).await?;
//! run_migrations(&pool).await?;
//! let adapter = PostgresBillingAdapter::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::PostgresBillingAdapter;
