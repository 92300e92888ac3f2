use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use futures_util::future::BoxFuture;
use tokio::{
    sync::oneshot,
    time::{interval_at, Instant},
};

use crate::{step, Config, Output, Step, StepFuture};

pub type CountFuture<'c> = BoxFuture<'c, anyhow::Result<u64>>;

/// Completed units of an incremental step.
///
/// The executor receives a clone and reports each finished unit; the progress
/// ticker reads the same counter.
#[derive(Debug, Clone, Default)]
pub struct Increment(Arc<AtomicU64>);

impl Increment {
    pub fn increment(&self) {
        self.add(1);
    }

    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Builds a step that counts its work with `count`, then runs `exec` while
/// reporting `X% complete` every `config.progress_interval`.
///
/// A zero count skips `exec` entirely. A count error is returned before
/// `exec` is called. `100% complete` is written once when `exec` succeeds.
pub fn incremental<C, N, E>(config: &Config, count: N, exec: E) -> Step<C>
where
    C: Send + 'static,
    N: for<'c> FnOnce(&'c mut C) -> CountFuture<'c> + Send + 'static,
    E: for<'c> FnOnce(&'c mut C, Increment) -> StepFuture<'c> + Send + 'static,
{
    let output = config.output.clone();
    let period = config.progress_interval;

    step(move |conn| Box::pin(run_incremental(conn, output, period, count, exec)))
}

async fn run_incremental<C, N, E>(
    conn: &mut C,
    output: Output,
    period: Duration,
    count: N,
    exec: E,
) -> anyhow::Result<()>
where
    C: Send + 'static,
    N: for<'c> FnOnce(&'c mut C) -> CountFuture<'c> + Send + 'static,
    E: for<'c> FnOnce(&'c mut C, Increment) -> StepFuture<'c> + Send + 'static,
{
    let total = count(&mut *conn).await?;

    if total == 0 {
        tracing::debug!("nothing to migrate, skipping incremental step");
        return Ok(());
    }

    let done = Increment::default();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let ticker = tokio::spawn(report_progress(
        output.clone(),
        period,
        total,
        done.clone(),
        shutdown_rx,
    ));

    let res = exec(conn, done.clone()).await;

    let _ = shutdown_tx.send(());

    if let Err(e) = ticker.await {
        tracing::error!(error = %e, "progress ticker panicked");
    }

    res?;

    tracing::debug!(total, done = done.get(), "incremental step completed");
    output.line(format_args!("100% complete"));

    Ok(())
}

async fn report_progress(
    output: Output,
    period: Duration,
    total: u64,
    done: Increment,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let period = period.max(Duration::from_millis(1));
    let mut interval = interval_at(Instant::now() + period, period);
    let mut last = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = interval.tick() => {
                let pct = (done.get().saturating_mul(100) / total).min(100);

                if pct > last && pct < 100 {
                    output.line(format_args!("{pct}% complete"));
                    last = pct;
                }
            }
        }
    }
}
