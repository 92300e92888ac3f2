//! Advisory locks serializing data fixes across replicas.
//!
//! Several server instances may start at the same time and run the same
//! pending migrations. Data fixes that are expensive to run twice take a lock
//! row first; failing to get it is not an error, the migration runs anyway.

use std::time::Duration;

use async_trait::async_trait;
use sea_query::{ColumnDef, Iden, Table, TableCreateStatement};

use fleet_migrate_core::Context;

#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "sqlite")]
mod sqlite;

#[derive(Iden, Clone, Copy)]
pub enum Locks {
    Table,
    Name,
    Owner,
    ExpiresAt,
}

fn create_table_statement() -> TableCreateStatement {
    Table::create()
        .table(Locks::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Locks::Name)
                .string_len(255)
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(Locks::Owner).string_len(255).null())
        .col(ColumnDef::new(Locks::ExpiresAt).timestamp().null())
        .to_owned()
}

/// Lock rows in the `locks` table.
///
/// At most one live row exists per name. Expired rows are reaped by the next
/// acquisition attempt.
#[async_trait]
pub trait AdvisoryLock: Send {
    async fn create_locks_table(&mut self) -> sqlx::Result<()>;

    /// Takes `name` for `owner` until `ttl` elapses. Returns false when a
    /// live lock already exists.
    async fn acquire_lock(&mut self, name: &str, owner: &str, ttl: Duration) -> sqlx::Result<bool>;

    /// Deletes `name` if it is held by `owner`.
    async fn release_lock(&mut self, name: &str, owner: &str) -> sqlx::Result<()>;
}

/// Lock taken by one migration run, with a random owner token.
#[derive(Debug)]
pub struct MigrationLock {
    name: String,
    owner: String,
    ttl: Duration,
    held: bool,
}

impl MigrationLock {
    pub fn new(name: impl Into<String>, ctx: &Context) -> Self {
        Self {
            name: name.into(),
            owner: uuid::Uuid::new_v4().to_string(),
            ttl: ctx.config().lock_ttl,
            held: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Tries to take the lock, logging a warning when it cannot.
    pub async fn acquire<C: AdvisoryLock>(&mut self, conn: &mut C) -> bool {
        match conn.acquire_lock(&self.name, &self.owner, self.ttl).await {
            Ok(true) => {
                tracing::debug!(lock = %self.name, owner = %self.owner, "lock acquired");
                self.held = true;
            }
            Ok(false) => {
                tracing::warn!(lock = %self.name, "lock held by another owner, proceeding without it");
            }
            Err(e) => {
                tracing::warn!(lock = %self.name, error = %e, "failed to acquire lock, proceeding without it");
            }
        }

        self.held
    }

    pub async fn release<C: AdvisoryLock>(&mut self, conn: &mut C) -> sqlx::Result<()> {
        if !self.held {
            return Ok(());
        }

        conn.release_lock(&self.name, &self.owner).await?;
        self.held = false;

        Ok(())
    }
}
