use std::time::Duration;

use async_trait::async_trait;
use sea_query::MysqlQueryBuilder;
use sqlx::MySqlConnection;

use super::{create_table_statement, AdvisoryLock};

#[async_trait]
impl AdvisoryLock for MySqlConnection {
    async fn create_locks_table(&mut self) -> sqlx::Result<()> {
        let statement = create_table_statement().to_string(MysqlQueryBuilder);
        sqlx::query(&statement).execute(self).await?;

        Ok(())
    }

    async fn acquire_lock(&mut self, name: &str, owner: &str, ttl: Duration) -> sqlx::Result<bool> {
        sqlx::query("DELETE FROM locks WHERE name = ? AND expires_at < CURRENT_TIMESTAMP")
            .bind(name)
            .execute(&mut *self)
            .await?;

        let res = sqlx::query(
            "INSERT IGNORE INTO locks (name, owner, expires_at) \
             VALUES (?, ?, DATE_ADD(CURRENT_TIMESTAMP, INTERVAL ? SECOND))",
        )
        .bind(name)
        .bind(owner)
        .bind(ttl.as_secs())
        .execute(self)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn release_lock(&mut self, name: &str, owner: &str) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM locks WHERE name = ? AND owner = ?")
            .bind(name)
            .bind(owner)
            .execute(self)
            .await?;

        Ok(())
    }
}
