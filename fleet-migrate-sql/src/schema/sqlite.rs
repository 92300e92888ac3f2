use async_trait::async_trait;
use sea_query::SqliteQueryBuilder;
use sqlx::SqliteConnection;

use super::{id_range_statement, range, Schema};

#[async_trait]
impl Schema for SqliteConnection {
    async fn table_exists(&mut self, table: &str) -> sqlx::Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table)
                .fetch_one(self)
                .await?;

        Ok(count > 0)
    }

    async fn column_exists(&mut self, table: &str, column: &str) -> sqlx::Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(self)
            .await?;

        Ok(count > 0)
    }

    async fn index_name_by_column_name(
        &mut self,
        table: &str,
        column: &str,
    ) -> sqlx::Result<Option<String>> {
        sqlx::query_scalar(
            "SELECT il.name FROM pragma_index_list(?) AS il, pragma_index_info(il.name) AS ii \
             WHERE ii.name = ? ORDER BY il.name, ii.seqno LIMIT 1",
        )
        .bind(table)
        .bind(column)
        .fetch_optional(self)
        .await
    }

    async fn constraint_exists(&mut self, table: &str, name: &str) -> sqlx::Result<bool> {
        // named constraints only survive in the CREATE TABLE text
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE tbl_name = ? \
             AND (name = ? OR sql LIKE '%CONSTRAINT ' || ? || ' %')",
        )
        .bind(table)
        .bind(name)
        .bind(name)
        .fetch_one(self)
        .await?;

        Ok(count > 0)
    }

    async fn id_range(&mut self, table: &str, column: &str) -> sqlx::Result<Option<(i64, i64)>> {
        let statement = id_range_statement(table, column, None).to_string(SqliteQueryBuilder);

        let bounds = sqlx::query_as::<_, (Option<i64>, Option<i64>)>(&statement)
            .fetch_one(self)
            .await?;

        Ok(range(bounds))
    }
}
