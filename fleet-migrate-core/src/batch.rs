use std::ops::Range;

/// Half-open primary key windows `[start, start + batch_size)` covering
/// `min..=max`.
///
/// Backfills walk a table one window at a time so that each statement only
/// locks a bounded range of rows:
///
/// ```rust,ignore
/// for window in ctx.batch_windows(min, max) {
///     sqlx::query("UPDATE t SET c = ? WHERE id >= ? AND id < ?")
///         .bind(value)
///         .bind(window.start)
///         .bind(window.end)
///         .execute(&mut *conn)
///         .await?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BatchWindows {
    next: i64,
    max: i64,
    batch_size: i64,
    done: bool,
}

impl BatchWindows {
    /// A `batch_size` of 0 is treated as 1.
    pub fn new(min: i64, max: i64, batch_size: u64) -> Self {
        let batch_size = i64::try_from(batch_size.max(1)).unwrap_or(i64::MAX);

        Self {
            next: min,
            max,
            batch_size,
            done: min > max,
        }
    }
}

impl Iterator for BatchWindows {
    type Item = Range<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let start = self.next;
        let end = start.saturating_add(self.batch_size);

        if end > self.max || end == i64::MAX {
            self.done = true;
        } else {
            self.next = end;
        }

        Some(start..end)
    }
}
