use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use fleet_migrate_core::{incremental, with_steps, Config, Increment, Output, Step};
use tokio::time::sleep;

type Conn = Vec<String>;

fn config(output: &Output, interval: Duration) -> Config {
    Config::builder()
        .output(output.clone())
        .progress_interval(interval)
        .build()
}

async fn increment_slowly(conn: &mut Conn, inc: Increment, units: u64) -> anyhow::Result<()> {
    for i in 0..units {
        sleep(Duration::from_millis(5)).await;
        conn.push(format!("unit {i}"));
        inc.increment();
    }

    Ok(())
}

async fn fail_after(conn: &mut Conn, inc: Increment, units: u64) -> anyhow::Result<()> {
    increment_slowly(conn, inc, units).await?;

    anyhow::bail!("executor failed")
}

fn counting(config: &Config, total: u64, units: u64) -> Step<Conn> {
    incremental(
        config,
        move |_conn: &mut Conn| Box::pin(async move { Ok::<_, anyhow::Error>(total) }),
        move |conn: &mut Conn, inc: Increment| Box::pin(increment_slowly(conn, inc, units)),
    )
}

#[tokio::test(start_paused = true)]
async fn reports_progress_until_complete() -> anyhow::Result<()> {
    let output = Output::memory();
    let config = config(&output, Duration::from_millis(10));
    let mut conn = Conn::new();

    counting(&config, 10, 10).run(&mut conn).await?;

    assert_eq!(conn.len(), 10);
    assert_eq!(
        output.contents(),
        "20% complete\n40% complete\n60% complete\n80% complete\n100% complete\n"
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn fast_executor_only_prints_completion() -> anyhow::Result<()> {
    let output = Output::memory();
    let config = config(&output, Duration::from_secs(5));
    let mut conn = Conn::new();

    counting(&config, 10, 10).run(&mut conn).await?;

    assert_eq!(output.contents(), "100% complete\n");

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn progress_never_decreases() -> anyhow::Result<()> {
    let output = Output::memory();
    let config = config(&output, Duration::from_millis(7));
    let mut conn = Conn::new();

    counting(&config, 37, 37).run(&mut conn).await?;

    let lines: Vec<u64> = output
        .contents()
        .lines()
        .map(|l| l.trim_end_matches("% complete").parse())
        .collect::<Result<_, _>>()?;

    assert!(lines.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(lines.iter().filter(|pct| **pct == 100).count(), 1);
    assert_eq!(lines.last(), Some(&100));

    Ok(())
}

#[tokio::test]
async fn zero_count_skips_executor() -> anyhow::Result<()> {
    let output = Output::memory();
    let config = config(&output, Duration::from_millis(10));
    let called = Arc::new(AtomicBool::new(false));
    let mut conn = Conn::new();

    let exec_called = called.clone();
    incremental(
        &config,
        |_conn: &mut Conn| Box::pin(async { Ok::<_, anyhow::Error>(0u64) }),
        move |_conn: &mut Conn, _inc: Increment| {
            exec_called.store(true, Ordering::SeqCst);
            Box::pin(async { Ok::<_, anyhow::Error>(()) })
        },
    )
    .run(&mut conn)
    .await?;

    assert!(!called.load(Ordering::SeqCst));
    assert_eq!(output.contents(), "");

    Ok(())
}

#[tokio::test]
async fn count_error_skips_executor() {
    let output = Output::memory();
    let config = config(&output, Duration::from_millis(10));
    let called = Arc::new(AtomicBool::new(false));
    let mut conn = Conn::new();

    let exec_called = called.clone();
    let err = incremental(
        &config,
        |_conn: &mut Conn| Box::pin(async { Err::<u64, _>(anyhow::anyhow!("count failed")) }),
        move |_conn: &mut Conn, _inc: Increment| {
            exec_called.store(true, Ordering::SeqCst);
            Box::pin(async { Ok::<_, anyhow::Error>(()) })
        },
    )
    .run(&mut conn)
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "count failed");
    assert!(!called.load(Ordering::SeqCst));
    assert_eq!(output.contents(), "");
}

#[tokio::test(start_paused = true)]
async fn executor_error_has_no_completion_line() {
    let output = Output::memory();
    let config = config(&output, Duration::from_millis(10));
    let mut conn = Conn::new();

    let err = incremental(
        &config,
        |_conn: &mut Conn| Box::pin(async { Ok::<_, anyhow::Error>(4u64) }),
        |conn: &mut Conn, inc: Increment| Box::pin(fail_after(conn, inc, 2)),
    )
    .run(&mut conn)
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "executor failed");
    assert_eq!(conn.len(), 2);
    assert!(!output.contents().contains("100% complete"));
}

#[tokio::test(start_paused = true)]
async fn incremental_step_inside_steps() -> anyhow::Result<()> {
    let output = Output::memory();
    let config = config(&output, Duration::from_secs(5));
    let mut conn = Conn::new();

    with_steps(
        &output,
        &mut conn,
        vec![counting(&config, 3, 3), counting(&config, 0, 0)],
    )
    .await?;

    assert_eq!(
        output.contents(),
        "Step 1 of 2\n100% complete\nStep 2 of 2\n"
    );

    Ok(())
}
