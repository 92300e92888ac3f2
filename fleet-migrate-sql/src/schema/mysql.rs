use async_trait::async_trait;
use sea_query::MysqlQueryBuilder;
use sqlx::MySqlConnection;

use super::{id_range_statement, range, Schema};

#[async_trait]
impl Schema for MySqlConnection {
    async fn table_exists(&mut self, table: &str) -> sqlx::Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = ?",
        )
        .bind(table)
        .fetch_one(self)
        .await?;

        Ok(count > 0)
    }

    async fn column_exists(&mut self, table: &str, column: &str) -> sqlx::Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE table_schema = DATABASE() AND table_name = ? AND column_name = ?",
        )
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
            "SELECT CAST(index_name AS CHAR) FROM information_schema.statistics \
             WHERE table_schema = DATABASE() AND table_name = ? AND column_name = ? \
             ORDER BY index_name, seq_in_index LIMIT 1",
        )
        .bind(table)
        .bind(column)
        .fetch_optional(self)
        .await
    }

    async fn constraint_exists(&mut self, table: &str, name: &str) -> sqlx::Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.table_constraints \
             WHERE table_schema = DATABASE() AND table_name = ? AND constraint_name = ?",
        )
        .bind(table)
        .bind(name)
        .fetch_one(self)
        .await?;

        Ok(count > 0)
    }

    async fn id_range(&mut self, table: &str, column: &str) -> sqlx::Result<Option<(i64, i64)>> {
        // unsigned columns come back as BIGINT UNSIGNED otherwise
        let statement =
            id_range_statement(table, column, Some("SIGNED")).to_string(MysqlQueryBuilder);

        let bounds = sqlx::query_as::<_, (Option<i64>, Option<i64>)>(&statement)
            .fetch_one(self)
            .await?;

        Ok(range(bounds))
    }
}
