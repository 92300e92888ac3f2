#![allow(dead_code)]

use sea_query::{ColumnDef, Iden, Index, IndexCreateStatement, Table, TableAlterStatement, TableCreateStatement};

pub const CREATE_SCRIPT_CONTENTS: i64 = 20240101000000;
pub const ADD_CHECKSUM_COLUMN: i64 = 20240201000000;
pub const BACKFILL_CHECKSUMS: i64 = 20240301000000;
pub const DEDUPE_SCRIPT_CONTENTS: i64 = 20240401000000;

pub const CHECKSUM_INDEX: &str = "idx_script_contents_md5_checksum";
pub const DEDUPE_LOCK: &str = "script_contents_dedupe";

pub const INSERT_SCRIPT: &str = "INSERT INTO script_contents (contents) VALUES (?)";
pub const COUNT_MISSING_CHECKSUMS: &str =
    "SELECT COUNT(*) FROM script_contents WHERE md5_checksum IS NULL";
pub const SELECT_WINDOW: &str = "SELECT id, contents FROM script_contents \
     WHERE id >= ? AND id < ? AND md5_checksum IS NULL";
pub const UPDATE_CHECKSUM: &str = "UPDATE script_contents SET md5_checksum = ? WHERE id = ?";
pub const DELETE_DUPLICATES: &str = "DELETE FROM script_contents WHERE id NOT IN \
     (SELECT id FROM (SELECT MIN(id) AS id FROM script_contents GROUP BY md5_checksum) AS kept)";

#[derive(Iden, Clone, Copy)]
pub enum ScriptContents {
    Table,
    Id,
    Contents,
    Md5Checksum,
}

pub fn create_table_statement() -> TableCreateStatement {
    Table::create()
        .table(ScriptContents::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(ScriptContents::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(ScriptContents::Contents).text().not_null())
        .to_owned()
}

pub fn add_checksum_statement() -> TableAlterStatement {
    Table::alter()
        .table(ScriptContents::Table)
        .add_column(ColumnDef::new(ScriptContents::Md5Checksum).char_len(32).null())
        .to_owned()
}

pub fn checksum_index_statement() -> IndexCreateStatement {
    Index::create()
        .name(CHECKSUM_INDEX)
        .table(ScriptContents::Table)
        .col(ScriptContents::Md5Checksum)
        .unique()
        .to_owned()
}

/// Stamps the `script_contents` migrations for one backend.
///
/// `$conn` is the connection type, `$builder` the matching sea-query builder.
macro_rules! script_migrations {
    ($conn:ty, $builder:expr) => {
        pub mod migrations {
            use fleet_migrate_core::{
                async_trait, Config, Context, Increment, Migration, Migrator,
            };
            use fleet_migrate_sql::{md5_checksum, AdvisoryLock, MigrationLock, Schema};

            use crate::common::{
                add_checksum_statement, checksum_index_statement, create_table_statement,
                ADD_CHECKSUM_COLUMN, BACKFILL_CHECKSUMS, COUNT_MISSING_CHECKSUMS,
                CREATE_SCRIPT_CONTENTS, DEDUPE_LOCK, DEDUPE_SCRIPT_CONTENTS, DELETE_DUPLICATES,
                SELECT_WINDOW, UPDATE_CHECKSUM,
            };

            pub type Conn = $conn;

            pub fn migrator(config: Config) -> fleet_migrate_core::Result<Migrator<Conn>> {
                let mut migrator = Migrator::new("tables", config);
                migrator.add_migration(Box::new(DedupeScriptContents))?;
                migrator.add_migration(Box::new(CreateScriptContents))?;
                migrator.add_migration(Box::new(BackfillChecksums))?;
                migrator.add_migration(Box::new(AddChecksumColumn))?;

                Ok(migrator)
            }

            pub struct CreateScriptContents;

            #[async_trait]
            impl Migration<Conn> for CreateScriptContents {
                fn version(&self) -> i64 {
                    CREATE_SCRIPT_CONTENTS
                }

                fn name(&self) -> &str {
                    "CreateScriptContents"
                }

                async fn up(&self, conn: &mut Conn, _ctx: &Context) -> anyhow::Result<()> {
                    let statement = create_table_statement().to_string($builder);
                    sqlx::query(&statement).execute(conn).await?;

                    Ok(())
                }
            }

            pub struct AddChecksumColumn;

            #[async_trait]
            impl Migration<Conn> for AddChecksumColumn {
                fn version(&self) -> i64 {
                    ADD_CHECKSUM_COLUMN
                }

                fn name(&self) -> &str {
                    "AddChecksumColumn"
                }

                async fn up(&self, conn: &mut Conn, _ctx: &Context) -> anyhow::Result<()> {
                    if conn.column_exists("script_contents", "md5_checksum").await? {
                        return Ok(());
                    }

                    let statement = add_checksum_statement().to_string($builder);
                    sqlx::query(&statement).execute(conn).await?;

                    Ok(())
                }
            }

            pub struct BackfillChecksums;

            #[async_trait]
            impl Migration<Conn> for BackfillChecksums {
                fn version(&self) -> i64 {
                    BACKFILL_CHECKSUMS
                }

                fn name(&self) -> &str {
                    "BackfillChecksums"
                }

                async fn up(&self, conn: &mut Conn, ctx: &Context) -> anyhow::Result<()> {
                    let windows = ctx.clone();

                    ctx.with_steps(
                        conn,
                        vec![ctx.incremental(
                            |conn: &mut Conn| Box::pin(count_missing(conn)),
                            move |conn: &mut Conn, inc: Increment| {
                                Box::pin(backfill(conn, windows, inc))
                            },
                        )],
                    )
                    .await
                }
            }

            async fn count_missing(conn: &mut Conn) -> anyhow::Result<u64> {
                let count: i64 = sqlx::query_scalar(COUNT_MISSING_CHECKSUMS)
                    .fetch_one(conn)
                    .await?;

                Ok(u64::try_from(count)?)
            }

            async fn backfill(conn: &mut Conn, ctx: Context, inc: Increment) -> anyhow::Result<()> {
                let Some((min, max)) = conn.id_range("script_contents", "id").await? else {
                    return Ok(());
                };

                for window in ctx.batch_windows(min, max) {
                    let rows: Vec<(i64, String)> = sqlx::query_as(SELECT_WINDOW)
                        .bind(window.start)
                        .bind(window.end)
                        .fetch_all(&mut *conn)
                        .await?;

                    for (id, contents) in rows {
                        sqlx::query(UPDATE_CHECKSUM)
                            .bind(md5_checksum(&contents))
                            .bind(id)
                            .execute(&mut *conn)
                            .await?;

                        inc.increment();
                    }
                }

                Ok(())
            }

            pub struct DedupeScriptContents;

            #[async_trait]
            impl Migration<Conn> for DedupeScriptContents {
                fn version(&self) -> i64 {
                    DEDUPE_SCRIPT_CONTENTS
                }

                fn name(&self) -> &str {
                    "DedupeScriptContents"
                }

                async fn up(&self, conn: &mut Conn, ctx: &Context) -> anyhow::Result<()> {
                    conn.create_locks_table().await?;

                    let mut lock = MigrationLock::new(DEDUPE_LOCK, ctx);
                    lock.acquire(&mut *conn).await;

                    let res = dedupe(&mut *conn).await;

                    lock.release(&mut *conn).await?;

                    res
                }
            }

            async fn dedupe(conn: &mut Conn) -> anyhow::Result<()> {
                sqlx::query(DELETE_DUPLICATES).execute(&mut *conn).await?;

                if conn
                    .index_name_by_column_name("script_contents", "md5_checksum")
                    .await?
                    .is_none()
                {
                    let statement = checksum_index_statement().to_string($builder);
                    sqlx::query(&statement).execute(&mut *conn).await?;
                }

                Ok(())
            }
        }
    };
}
