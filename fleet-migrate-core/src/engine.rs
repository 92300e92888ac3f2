use async_trait::async_trait;

use crate::{error::Result, Context, Migration};

mod memory;

pub use memory::*;

/// Table recording which migration versions are applied.
pub const DEFAULT_LEDGER_TABLE: &str = "migration_status_tables";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn is_applied(&self) -> bool {
        matches!(self, Direction::Up)
    }
}

/// Ledger storage and transaction boundary of a [`Migrator`](crate::Migrator).
#[async_trait]
pub trait Engine<C: Send>: Send + Sync {
    /// Creates the ledger if it does not exist yet.
    async fn init(&self, conn: &mut C) -> Result<()>;

    /// Applied versions, in the order they were applied.
    async fn applied(&self, conn: &mut C) -> Result<Vec<i64>>;

    /// Runs `migration` in `direction` and records the outcome, atomically
    /// when the backend allows it.
    async fn apply(
        &self,
        conn: &mut C,
        migration: &dyn Migration<C>,
        ctx: &Context,
        direction: Direction,
    ) -> Result<()>;
}

/// Folds ledger rows, oldest first, into the applied versions.
///
/// A version counts as applied when its latest row is. The bootstrap row
/// (version 0) is skipped.
pub fn applied_versions(rows: impl IntoIterator<Item = (i64, bool)>) -> Vec<i64> {
    let mut applied: Vec<i64> = Vec::new();

    for (version, is_applied) in rows {
        if version <= 0 {
            continue;
        }

        applied.retain(|v| *v != version);

        if is_applied {
            applied.push(version);
        }
    }

    applied
}
