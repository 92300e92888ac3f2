//! SQL backends for fleet migrations.
//!
//! - [`Sql`] keeps the migration ledger in a table of the migrated database
//!   and runs every migration in its own transaction.
//! - [`Schema`] answers the existence checks that make migrations safe to
//!   re-enter.
//! - [`AdvisoryLock`] and [`MigrationLock`] serialize data fixes across
//!   replicas.
//!
//! # Features
//!
//! - **`mysql`** - MySQL, the production store
//! - **`sqlite`** - SQLite, for local runs and tests
//!
//! Both are enabled by default.
//!
//! ```rust,ignore
//! let mut conn = pool.acquire().await?;
//! let engine = fleet_migrate_sql::MySql::new();
//!
//! migrator.up(&engine, &mut *conn).await?;
//! ```

#![forbid(unsafe_code)]

mod checksum;
#[cfg(feature = "mysql")]
mod collation;
mod lock;
mod schema;
mod sql;

pub use checksum::*;
#[cfg(feature = "mysql")]
pub use collation::*;
pub use lock::*;
pub use schema::*;
pub use sql::*;
