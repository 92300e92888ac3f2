use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::{
    engine::{applied_versions, Direction, Engine},
    error::{MigrateError, Result},
    Context, Migration,
};

/// Ledger kept in memory.
///
/// Migrations run directly on the connection they are given, a failing
/// migration leaves whatever it already did in place and no ledger row.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine(Arc<RwLock<Option<Vec<(i64, bool)>>>>);

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger rows `(version, is_applied)`, oldest first.
    pub fn rows(&self) -> Vec<(i64, bool)> {
        self.0.read().clone().unwrap_or_default()
    }
}

#[async_trait]
impl<C: Send + 'static> Engine<C> for MemoryEngine {
    async fn init(&self, _conn: &mut C) -> Result<()> {
        let mut ledger = self.0.write();

        if ledger.is_none() {
            *ledger = Some(vec![(0, true)]);
        }

        Ok(())
    }

    async fn applied(&self, _conn: &mut C) -> Result<Vec<i64>> {
        match self.0.read().as_ref() {
            Some(rows) => Ok(applied_versions(rows.iter().copied())),
            None => Err(MigrateError::NotInitialized("memory".to_owned())),
        }
    }

    async fn apply(
        &self,
        conn: &mut C,
        migration: &dyn Migration<C>,
        ctx: &Context,
        direction: Direction,
    ) -> Result<()> {
        if self.0.read().is_none() {
            return Err(MigrateError::NotInitialized("memory".to_owned()));
        }

        match direction {
            Direction::Up => migration.up(conn, ctx).await?,
            Direction::Down => migration.down(conn, ctx).await?,
        };

        if let Some(rows) = self.0.write().as_mut() {
            rows.push((migration.version(), direction.is_applied()));
        }

        Ok(())
    }
}
