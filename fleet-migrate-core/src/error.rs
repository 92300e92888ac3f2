#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("invalid migration version {0}, versions must be positive")]
    InvalidVersion(i64),

    #[error("migration version {0} is registered more than once")]
    DuplicateVersion(i64),

    #[error("migration {version} ({name}) failed: {source:#}")]
    Migration {
        version: i64,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("database `{0}` is not initialized")]
    NotInitialized(String),

    #[error("database `{db}` is missing migrations: {details}")]
    MissingMigrations { db: String, details: String },

    #[error("database `{db}` has unknown migrations: {details}")]
    UnknownMigrations { db: String, details: String },

    #[cfg(feature = "sqlx")]
    #[error("sqlx `{0}`")]
    Sqlx(#[from] sqlx::Error),

    #[error("{0}")]
    Any(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MigrateError>;
