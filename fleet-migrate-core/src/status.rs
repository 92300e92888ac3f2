use std::collections::{BTreeSet, HashSet};

use crate::{
    error::{MigrateError, Result},
    Output,
};

const BANNER_RULE: &str =
    "################################################################################";

/// Compares `known` versions with the `applied` ones.
///
/// Returns the known versions that are not applied, the applied versions
/// that are not known (minus `known_unknowns`), and whether both lists are
/// empty. Neither input needs to be ordered.
pub fn compare_versions(
    known: &[i64],
    applied: &[i64],
    known_unknowns: &BTreeSet<i64>,
) -> (Vec<i64>, Vec<i64>, bool) {
    let known_set: HashSet<i64> = known.iter().copied().collect();
    let applied_set: HashSet<i64> = applied.iter().copied().collect();

    let missing: Vec<i64> = known
        .iter()
        .copied()
        .filter(|v| !applied_set.contains(v))
        .collect();

    let unknown: Vec<i64> = applied
        .iter()
        .copied()
        .filter(|v| !known_set.contains(v) && !known_unknowns.contains(v))
        .collect();

    let equal = missing.is_empty() && unknown.is_empty();

    (missing, unknown, equal)
}

/// Comparison of one migration set (e.g. `tables` or `data`) with its ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetStatus {
    pub name: String,
    pub applied: Vec<i64>,
    pub missing: Vec<i64>,
    pub unknown: Vec<i64>,
}

impl SetStatus {
    pub fn new(
        name: impl Into<String>,
        known: &[i64],
        applied: Vec<i64>,
        known_unknowns: &BTreeSet<i64>,
    ) -> Self {
        let (missing, unknown, _) = compare_versions(known, &applied, known_unknowns);

        Self {
            name: name.into(),
            applied,
            missing,
            unknown,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.unknown.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    NoMigrationsCompleted,
    AllMigrationsCompleted,
    UnknownMigrations,
    SomeMigrationsCompleted,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    /// Start even though known migrations are not applied yet
    pub allow_missing: bool,

    /// Refuse to start on unknown migrations
    pub dev: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub code: StatusCode,
    pub sets: Vec<SetStatus>,
}

impl MigrationStatus {
    pub fn from_sets(sets: Vec<SetStatus>) -> Self {
        let code = if sets.iter().all(|s| s.applied.is_empty()) {
            StatusCode::NoMigrationsCompleted
        } else if sets.iter().all(SetStatus::is_complete) {
            StatusCode::AllMigrationsCompleted
        } else if sets.iter().any(|s| !s.unknown.is_empty()) {
            StatusCode::UnknownMigrations
        } else {
            StatusCode::SomeMigrationsCompleted
        };

        Self { code, sets }
    }

    /// `tables=[1, 2], data=[]`
    pub fn missing(&self) -> String {
        self.describe(|s| &s.missing)
    }

    pub fn unknown(&self) -> String {
        self.describe(|s| &s.unknown)
    }

    fn describe(&self, versions: impl Fn(&SetStatus) -> &Vec<i64>) -> String {
        self.sets
            .iter()
            .map(|s| format!("{}={:?}", s.name, versions(s)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Decides whether a server may start on the database `db`, printing a
    /// banner to `output` whenever it is not fully migrated.
    pub fn check(&self, db: &str, options: CheckOptions, output: &Output) -> Result<()> {
        match self.code {
            StatusCode::AllMigrationsCompleted => Ok(()),
            StatusCode::UnknownMigrations => {
                let details = self.unknown();

                banner(
                    output,
                    &[
                        "# WARNING:".to_owned(),
                        format!("#   Your {db:?} database has unrecognized migrations. This could happen when"),
                        "#   running an older version on a newer migrated database.".to_owned(),
                        "#".to_owned(),
                        format!("#   Unknown migrations: {details}."),
                    ],
                );

                tracing::warn!(db, unknown = %details, "database has unknown migrations");

                if options.dev {
                    return Err(MigrateError::UnknownMigrations {
                        db: db.to_owned(),
                        details,
                    });
                }

                Ok(())
            }
            StatusCode::SomeMigrationsCompleted => {
                let details = self.missing();

                banner(
                    output,
                    &[
                        "# WARNING:".to_owned(),
                        format!("#   Your {db:?} database is missing required migrations. This is likely to cause"),
                        "#   errors.".to_owned(),
                        "#".to_owned(),
                        format!("#   Missing migrations: {details}."),
                    ],
                );

                tracing::warn!(db, missing = %details, "database is missing migrations");

                if !options.allow_missing {
                    return Err(MigrateError::MissingMigrations {
                        db: db.to_owned(),
                        details,
                    });
                }

                Ok(())
            }
            StatusCode::NoMigrationsCompleted => {
                banner(
                    output,
                    &[
                        "# ERROR:".to_owned(),
                        format!("#   Your {db:?} database is not initialized."),
                    ],
                );

                Err(MigrateError::NotInitialized(db.to_owned()))
            }
        }
    }
}

fn banner(output: &Output, lines: &[String]) {
    output.line(format_args!("{BANNER_RULE}"));

    for line in lines {
        output.line(format_args!("{line}"));
    }

    output.line(format_args!("{BANNER_RULE}"));
}
