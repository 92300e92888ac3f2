//! Composite step runner.
//!
//! A migration that has to perform several irreversible units of work inside
//! one transaction lists them as [`Step`]s and hands them to [`with_steps`]:
//!
//! ```rust,ignore
//! ctx.with_steps(
//!     conn,
//!     vec![
//!         step(|conn| Box::pin(add_checksum_column(conn))),
//!         step(|conn| Box::pin(drop_legacy_index(conn))),
//!     ],
//! )
//! .await?;
//! ```

use anyhow::Context as _;
use futures_util::future::BoxFuture;

use crate::Output;

pub type StepFuture<'c> = BoxFuture<'c, anyhow::Result<()>>;

type StepFn<C> = Box<dyn for<'c> FnOnce(&'c mut C) -> StepFuture<'c> + Send>;

/// One irreversible unit of work performed on an open connection.
pub struct Step<C> {
    run: StepFn<C>,
}

impl<C: Send + 'static> Step<C> {
    pub async fn run(self, conn: &mut C) -> anyhow::Result<()> {
        (self.run)(conn).await
    }
}

/// Wraps `f` into a [`Step`].
pub fn step<C, F>(f: F) -> Step<C>
where
    C: Send + 'static,
    F: for<'c> FnOnce(&'c mut C) -> StepFuture<'c> + Send + 'static,
{
    Step { run: Box::new(f) }
}

/// Runs `steps` in order on `conn`, stopping at the first failure.
///
/// `Step i of N` is written to `output` before each step when there is more
/// than one. Nothing is retried and nothing is rolled back here, the caller
/// owns the transaction.
pub async fn with_steps<C>(output: &Output, conn: &mut C, steps: Vec<Step<C>>) -> anyhow::Result<()>
where
    C: Send + 'static,
{
    let total = steps.len();

    for (i, step) in steps.into_iter().enumerate() {
        let n = i + 1;

        if total > 1 {
            output.line(format_args!("Step {n} of {total}"));
        }

        tracing::debug!(step = n, total, "running migration step");

        let res = step.run(conn).await;

        if total > 1 {
            res.with_context(|| format!("step {n} of {total}"))?;
        } else {
            res?;
        }
    }

    Ok(())
}
