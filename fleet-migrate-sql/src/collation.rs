use anyhow::{bail, Context as _};
use sqlx::MySqlConnection;

use fleet_migrate_core::Context;

/// Converts every base table of the current schema whose collation is not
/// `collation` to `charset`/`collation`, returning the converted tables.
///
/// Does nothing when `disable_collation_updates` is set, which test suites
/// use to skip the slow table rebuilds.
pub async fn ensure_uniform_collation(
    conn: &mut MySqlConnection,
    ctx: &Context,
    charset: &str,
    collation: &str,
) -> anyhow::Result<Vec<String>> {
    if ctx.config().disable_collation_updates {
        tracing::info!(version = ctx.version(), "collation updates disabled, skipping");
        return Ok(vec![]);
    }

    for ident in [charset, collation] {
        if ident.is_empty() || !ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            bail!("invalid charset or collation name `{ident}`");
        }
    }

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
         WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' \
         AND (table_collation IS NULL OR table_collation <> ?) \
         ORDER BY table_name",
    )
    .bind(collation)
    .fetch_all(&mut *conn)
    .await?;

    if tables.is_empty() {
        return Ok(tables);
    }

    sqlx::query("SET FOREIGN_KEY_CHECKS = 0")
        .execute(&mut *conn)
        .await?;

    let res = convert_tables(conn, ctx, &tables, charset, collation).await;

    sqlx::query("SET FOREIGN_KEY_CHECKS = 1")
        .execute(&mut *conn)
        .await?;

    res?;

    Ok(tables)
}

async fn convert_tables(
    conn: &mut MySqlConnection,
    ctx: &Context,
    tables: &[String],
    charset: &str,
    collation: &str,
) -> anyhow::Result<()> {
    let total = tables.len();

    for (i, table) in tables.iter().enumerate() {
        ctx.output()
            .line(format_args!("Converting table {} of {total}: {table}", i + 1));

        let statement = format!(
            "ALTER TABLE `{}` CONVERT TO CHARACTER SET {charset} COLLATE {collation}",
            table.replace('`', "``")
        );

        sqlx::query(&statement)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("converting table {table} to {collation}"))?;
    }

    Ok(())
}
