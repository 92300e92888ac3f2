use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    progress::{self, CountFuture, Increment},
    step, BatchWindows, Config, Output, Step, StepFuture,
};

/// One forward step of the schema or of the data it holds.
///
/// Versions are timestamp-derived (`20241002104104`) and strictly positive.
/// Most migrations cannot be reverted, `down` defaults to doing nothing.
///
/// ```rust,ignore
/// struct AddChecksumColumn;
///
/// #[async_trait]
/// impl Migration<SqliteConnection> for AddChecksumColumn {
///     fn version(&self) -> i64 {
///         20240930171917
///     }
///
///     fn name(&self) -> &str {
///         "AddChecksumColumn"
///     }
///
///     async fn up(&self, conn: &mut SqliteConnection, _ctx: &Context) -> anyhow::Result<()> {
///         if conn.column_exists("script_contents", "md5_checksum").await? {
///             return Ok(());
///         }
///
///         sqlx::query("ALTER TABLE script_contents ADD COLUMN md5_checksum TEXT")
///             .execute(conn)
///             .await?;
///
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Migration<C: Send>: Send + Sync {
    fn version(&self) -> i64;

    fn name(&self) -> &str;

    async fn up(&self, conn: &mut C, ctx: &Context) -> anyhow::Result<()>;

    async fn down(&self, _conn: &mut C, _ctx: &Context) -> anyhow::Result<()> {
        Ok(())
    }
}

/// What a migration body can reach besides its connection.
#[derive(Debug, Clone)]
pub struct Context {
    version: i64,
    config: Arc<Config>,
}

impl Context {
    pub fn new(version: i64, config: Arc<Config>) -> Self {
        Self { version, config }
    }

    /// Version of the migration being applied.
    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output(&self) -> &Output {
        &self.config.output
    }

    /// See [`with_steps`](crate::with_steps).
    pub async fn with_steps<C>(&self, conn: &mut C, steps: Vec<Step<C>>) -> anyhow::Result<()>
    where
        C: Send + 'static,
    {
        step::with_steps(&self.config.output, conn, steps).await
    }

    /// See [`incremental`](crate::incremental).
    pub fn incremental<C, N, E>(&self, count: N, exec: E) -> Step<C>
    where
        C: Send + 'static,
        N: for<'c> FnOnce(&'c mut C) -> CountFuture<'c> + Send + 'static,
        E: for<'c> FnOnce(&'c mut C, Increment) -> StepFuture<'c> + Send + 'static,
    {
        progress::incremental(&self.config, count, exec)
    }

    /// Windows of `config.batch_size` keys over `min..=max`.
    pub fn batch_windows(&self, min: i64, max: i64) -> BatchWindows {
        BatchWindows::new(min, max, self.config.batch_size)
    }
}
