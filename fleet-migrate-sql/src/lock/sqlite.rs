use std::time::Duration;

use async_trait::async_trait;
use sea_query::SqliteQueryBuilder;
use sqlx::SqliteConnection;

use super::{create_table_statement, AdvisoryLock};

#[async_trait]
impl AdvisoryLock for SqliteConnection {
    async fn create_locks_table(&mut self) -> sqlx::Result<()> {
        let statement = create_table_statement().to_string(SqliteQueryBuilder);
        sqlx::query(&statement).execute(self).await?;

        Ok(())
    }

    async fn acquire_lock(&mut self, name: &str, owner: &str, ttl: Duration) -> sqlx::Result<bool> {
        sqlx::query("DELETE FROM locks WHERE name = ? AND expires_at < datetime('now')")
            .bind(name)
            .execute(&mut *self)
            .await?;

        let res = sqlx::query(
            "INSERT OR IGNORE INTO locks (name, owner, expires_at) \
             VALUES (?, ?, datetime('now', ?))",
        )
        .bind(name)
        .bind(owner)
        .bind(format!("+{} seconds", ttl.as_secs()))
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
