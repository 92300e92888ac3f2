//! Existence checks letting a migration be applied again after a partial run.
//!
//! ```rust,ignore
//! if conn.column_exists("script_contents", "md5_checksum").await? {
//!     return Ok(());
//! }
//! ```

use async_trait::async_trait;
use sea_query::{Alias, Expr, Func, Query, SelectStatement, SimpleExpr};

#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "sqlite")]
mod sqlite;

/// Schema lookups against the database the connection is using.
#[async_trait]
pub trait Schema: Send {
    async fn table_exists(&mut self, table: &str) -> sqlx::Result<bool>;

    async fn column_exists(&mut self, table: &str, column: &str) -> sqlx::Result<bool>;

    /// True when every column in `columns` exists.
    async fn columns_exist(&mut self, table: &str, columns: &[&str]) -> sqlx::Result<bool> {
        for column in columns {
            if !self.column_exists(table, column).await? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Name of the first index covering `column`, if any.
    async fn index_name_by_column_name(
        &mut self,
        table: &str,
        column: &str,
    ) -> sqlx::Result<Option<String>>;

    async fn constraint_exists(&mut self, table: &str, name: &str) -> sqlx::Result<bool>;

    /// `MIN` and `MAX` of `column`, `None` on an empty table.
    ///
    /// Used to seed [`BatchWindows`](fleet_migrate_core::BatchWindows).
    async fn id_range(&mut self, table: &str, column: &str) -> sqlx::Result<Option<(i64, i64)>>;
}

fn id_range_statement(table: &str, column: &str, cast_as: Option<&str>) -> SelectStatement {
    let bound = |expr: SimpleExpr| -> SimpleExpr {
        match cast_as {
            Some(ty) => Func::cast_as(expr, Alias::new(ty)).into(),
            None => expr,
        }
    };

    Query::select()
        .expr(bound(Func::min(Expr::col(Alias::new(column))).into()))
        .expr(bound(Func::max(Expr::col(Alias::new(column))).into()))
        .from(Alias::new(table))
        .to_owned()
}

fn range(bounds: (Option<i64>, Option<i64>)) -> Option<(i64, i64)> {
    match bounds {
        (Some(min), Some(max)) => Some((min, max)),
        _ => None,
    }
}
