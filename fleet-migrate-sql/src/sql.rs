use std::marker::PhantomData;

use async_trait::async_trait;
#[cfg(feature = "mysql")]
use sea_query::MysqlQueryBuilder;
#[cfg(feature = "sqlite")]
use sea_query::SqliteQueryBuilder;
use sea_query::{
    Alias, ColumnDef, Expr, Func, Iden, InsertStatement, Order, Query, SchemaStatementBuilder,
    Table, TableCreateStatement, Values,
};
use sea_query_binder::{SqlxBinder, SqlxValues};
use sqlx::{Connection, Database};

use fleet_migrate_core::{
    applied_versions, Context, Direction, Engine, Migration, Result, DEFAULT_LEDGER_TABLE,
};

/// Columns of a migration ledger table.
///
/// The table name is configurable, see [`Sql::with_table`].
#[derive(Iden, Clone, Copy)]
pub enum Ledger {
    Id,
    VersionId,
    IsApplied,
    Tstamp,
}

/// Migration ledger stored in a SQL table of the migrated database.
///
/// Every migration runs in its own transaction together with the ledger row
/// recording it. MySQL commits DDL implicitly, so a failing migration may
/// leave part of its schema changes behind; migrations guard against that
/// with the [`Schema`](crate::Schema) checks.
#[derive(Debug, Clone)]
pub struct Sql<DB> {
    table: String,
    _db: PhantomData<fn() -> DB>,
}

/// Ledger on MySQL, equivalent to `Sql<sqlx::MySql>`.
#[cfg(feature = "mysql")]
pub type MySql = Sql<sqlx::MySql>;

/// Ledger on SQLite, equivalent to `Sql<sqlx::Sqlite>`.
#[cfg(feature = "sqlite")]
pub type Sqlite = Sql<sqlx::Sqlite>;

impl<DB: Database> Sql<DB> {
    pub fn new() -> Self {
        Self::with_table(DEFAULT_LEDGER_TABLE)
    }

    /// Ledger kept in `table`, e.g. `migration_status_data` for data migrations.
    pub fn with_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            _db: PhantomData,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn build_sqlx<S: SqlxBinder>(statement: S) -> (String, SqlxValues) {
        match DB::NAME {
            #[cfg(feature = "sqlite")]
            "SQLite" => statement.build_sqlx(SqliteQueryBuilder),
            #[cfg(feature = "mysql")]
            "MySQL" => statement.build_sqlx(MysqlQueryBuilder),
            name => panic!("'{name}' not supported, consider using SQLite or MySQL"),
        }
    }

    fn build_schema<S: SchemaStatementBuilder>(statement: S) -> String {
        match DB::NAME {
            #[cfg(feature = "sqlite")]
            "SQLite" => statement.to_string(SqliteQueryBuilder),
            #[cfg(feature = "mysql")]
            "MySQL" => statement.to_string(MysqlQueryBuilder),
            name => panic!("'{name}' not supported, consider using SQLite or MySQL"),
        }
    }

    fn create_table_statement(&self) -> TableCreateStatement {
        Table::create()
            .table(Alias::new(&self.table))
            .if_not_exists()
            .col(
                ColumnDef::new(Ledger::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(Ledger::VersionId).big_integer().not_null())
            .col(ColumnDef::new(Ledger::IsApplied).boolean().not_null())
            .col(
                ColumnDef::new(Ledger::Tstamp)
                    .timestamp()
                    .null()
                    .default(Expr::current_timestamp()),
            )
            .to_owned()
    }

    fn record_statement(&self, version: i64, is_applied: bool) -> InsertStatement {
        Query::insert()
            .into_table(Alias::new(&self.table))
            .columns([Ledger::VersionId, Ledger::IsApplied])
            .values_panic([version.into(), is_applied.into()])
            .to_owned()
    }
}

impl<DB: Database> Default for Sql<DB> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<DB> Engine<DB::Connection> for Sql<DB>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    (i64,): for<'r> sqlx::FromRow<'r, DB::Row>,
    (i64, bool): for<'r> sqlx::FromRow<'r, DB::Row>,
{
    async fn init(&self, conn: &mut DB::Connection) -> Result<()> {
        let statement = Self::build_schema(self.create_table_statement());
        sqlx::query_with::<DB, _>(&statement, SqlxValues(Values(Vec::new())))
            .execute(&mut *conn)
            .await?;

        let statement = Query::select()
            .expr(Func::count(Expr::col(Ledger::Id)))
            .from(Alias::new(&self.table))
            .to_owned();

        let (sql, values) = Self::build_sqlx(statement);
        let (rows,) = sqlx::query_as_with::<DB, (i64,), _>(&sql, values)
            .fetch_one(&mut *conn)
            .await?;

        if rows == 0 {
            let (sql, values) = Self::build_sqlx(self.record_statement(0, true));
            sqlx::query_with::<DB, _>(&sql, values)
                .execute(&mut *conn)
                .await?;

            tracing::debug!(table = %self.table, "migration ledger created");
        }

        Ok(())
    }

    async fn applied(&self, conn: &mut DB::Connection) -> Result<Vec<i64>> {
        let statement = Query::select()
            .columns([Ledger::VersionId, Ledger::IsApplied])
            .from(Alias::new(&self.table))
            .order_by(Ledger::Id, Order::Asc)
            .to_owned();

        let (sql, values) = Self::build_sqlx(statement);
        let rows = sqlx::query_as_with::<DB, (i64, bool), _>(&sql, values)
            .fetch_all(&mut *conn)
            .await?;

        Ok(applied_versions(rows))
    }

    async fn apply(
        &self,
        conn: &mut DB::Connection,
        migration: &dyn Migration<DB::Connection>,
        ctx: &Context,
        direction: Direction,
    ) -> Result<()> {
        let mut tx = conn.begin().await?;

        match direction {
            Direction::Up => migration.up(&mut *tx, ctx).await?,
            Direction::Down => migration.down(&mut *tx, ctx).await?,
        };

        let (sql, values) =
            Self::build_sqlx(self.record_statement(migration.version(), direction.is_applied()));
        sqlx::query_with::<DB, _>(&sql, values)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
