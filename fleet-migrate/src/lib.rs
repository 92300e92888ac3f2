//! Harness for the one-shot schema and data migrations of the fleet store.
//!
//! Migrations implement [`Migration`] and are registered on a [`Migrator`],
//! which applies the pending ones in version order through an [`Engine`]
//! keeping the ledger. Bodies compose [`Step`]s and report progress of long
//! backfills with [`Context::incremental`].
//!
//! # Features
//!
//! - **`mysql`** - [`sql::MySql`] ledger, schema guards, locks and collation updates
//! - **`sqlite`** - [`sql::Sqlite`] ledger, schema guards and locks
//!
//! ```rust,ignore
//! let mut migrator = Migrator::new("tables", Config::from_env());
//! migrator.add_migration(Box::new(CreateScriptContents))?;
//!
//! migrator.up(&fleet_migrate::sql::MySql::new(), &mut conn).await?;
//! ```

#![forbid(unsafe_code)]

pub use fleet_migrate_core::*;

#[cfg(any(feature = "mysql", feature = "sqlite"))]
pub mod sql {
    pub use fleet_migrate_sql::*;
}
