use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[source] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationFailed(#[from] sqlx::migrate::MigrateError),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Invalid database configuration: {0}")]
    InvalidConfig(String),

    #[error("Database error: {0}")]
    Other(String),
}

impl DatabaseError {
    pub fn duplicate(entity: &str, field: &str) -> Self {
        Self::DuplicateEntry(format!("{} with {} already exists", entity, field))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateEntry(_))
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let constraint = db_err.constraint().unwrap_or("unique constraint");
                DatabaseError::DuplicateEntry(constraint.to_string())
            }
            _ => DatabaseError::ConnectionError(err),
        }
    }
}
