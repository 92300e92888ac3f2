use std::{collections::BTreeSet, sync::Arc, time::Instant};

use crate::{
    error::{MigrateError, Result},
    Config, Context, Direction, Engine, Migration, SetStatus,
};

/// Ordered set of migrations and the driver applying them.
///
/// Migrations are registered explicitly, usually from one function listing
/// every migration of the set:
///
/// ```rust,ignore
/// pub fn tables(config: Config) -> Result<Migrator<SqliteConnection>> {
///     let mut migrator = Migrator::new("tables", config);
///     migrator.add_migration(Box::new(CreateScriptContents))?;
///     migrator.add_migration(Box::new(AddChecksumColumn))?;
///
///     Ok(migrator)
/// }
/// ```
pub struct Migrator<C: Send> {
    name: String,
    config: Arc<Config>,
    migrations: Vec<Box<dyn Migration<C>>>,
    known_unknowns: BTreeSet<i64>,
}

impl<C: Send + 'static> Migrator<C> {
    pub fn new(name: impl Into<String>, config: Config) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            migrations: Vec::new(),
            known_unknowns: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registers `migration`, keeping the set ordered by version.
    pub fn add_migration(&mut self, migration: Box<dyn Migration<C>>) -> Result<()> {
        let version = migration.version();

        if version <= 0 {
            return Err(MigrateError::InvalidVersion(version));
        }

        match self
            .migrations
            .binary_search_by_key(&version, |m| m.version())
        {
            Ok(_) => Err(MigrateError::DuplicateVersion(version)),
            Err(pos) => {
                self.migrations.insert(pos, migration);
                Ok(())
            }
        }
    }

    /// Version that may sit in the ledger without a registered migration,
    /// typically one whose timestamp was changed after it shipped.
    pub fn known_unknown(&mut self, version: i64) -> &mut Self {
        self.known_unknowns.insert(version);
        self
    }

    pub fn known_unknowns(&self) -> &BTreeSet<i64> {
        &self.known_unknowns
    }

    pub fn migrations(&self) -> &[Box<dyn Migration<C>>] {
        &self.migrations
    }

    pub fn versions(&self) -> Vec<i64> {
        self.migrations.iter().map(|m| m.version()).collect()
    }

    /// Registered migrations missing from `applied`, oldest first.
    pub fn pending(&self, applied: &[i64]) -> Vec<&dyn Migration<C>> {
        self.migrations
            .iter()
            .filter(|m| !applied.contains(&m.version()))
            .map(|m| &**m)
            .collect()
    }

    /// Applies every pending migration and returns the applied versions.
    pub async fn up<E: Engine<C>>(&self, engine: &E, conn: &mut C) -> Result<Vec<i64>> {
        self.run_up(engine, conn, None).await
    }

    /// Applies pending migrations up to and including `version`.
    pub async fn up_to<E: Engine<C>>(
        &self,
        engine: &E,
        conn: &mut C,
        version: i64,
    ) -> Result<Vec<i64>> {
        self.run_up(engine, conn, Some(version)).await
    }

    async fn run_up<E: Engine<C>>(
        &self,
        engine: &E,
        conn: &mut C,
        target: Option<i64>,
    ) -> Result<Vec<i64>> {
        engine.init(conn).await?;

        let applied = engine.applied(conn).await?;
        let pending = self.pending(&applied);

        tracing::debug!(
            set = %self.name,
            applied = applied.len(),
            pending = pending.len(),
            "applying migrations"
        );

        let mut done = Vec::new();

        for migration in pending {
            let version = migration.version();

            if target.is_some_and(|target| version > target) {
                break;
            }

            self.run(engine, conn, migration, Direction::Up).await?;
            done.push(version);
        }

        Ok(done)
    }

    /// Reverts the most recently applied registered migration.
    ///
    /// Most migrations do nothing on the way down, only the ledger changes.
    pub async fn down<E: Engine<C>>(&self, engine: &E, conn: &mut C) -> Result<Option<i64>> {
        engine.init(conn).await?;

        let applied = engine.applied(conn).await?;

        let Some(migration) = applied
            .iter()
            .rev()
            .find_map(|v| self.migrations.iter().find(|m| m.version() == *v))
        else {
            return Ok(None);
        };

        self.run(engine, conn, &**migration, Direction::Down)
            .await?;

        Ok(Some(migration.version()))
    }

    pub async fn status<E: Engine<C>>(&self, engine: &E, conn: &mut C) -> Result<SetStatus> {
        engine.init(conn).await?;

        let applied = engine.applied(conn).await?;

        Ok(SetStatus::new(
            self.name.as_str(),
            &self.versions(),
            applied,
            &self.known_unknowns,
        ))
    }

    #[tracing::instrument(
        skip_all,
        fields(
            set = %self.name,
            version = migration.version(),
            name = migration.name(),
            direction = ?direction,
        )
    )]
    async fn run<E: Engine<C>>(
        &self,
        engine: &E,
        conn: &mut C,
        migration: &dyn Migration<C>,
        direction: Direction,
    ) -> Result<()> {
        let version = migration.version();
        let name = migration.name();
        let ctx = Context::new(version, self.config.clone());
        let started_at = Instant::now();

        if let Err(e) = engine.apply(conn, migration, &ctx, direction).await {
            tracing::error!(error = %e, "migration failed");

            return Err(MigrateError::Migration {
                version,
                name: name.to_owned(),
                source: match e {
                    MigrateError::Any(e) => e,
                    e => e.into(),
                },
            });
        }

        tracing::info!(
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "migration applied"
        );

        Ok(())
    }
}
