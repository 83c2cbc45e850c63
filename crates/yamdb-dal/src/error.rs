pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Referenced record not found: {0}")]
    ReferenceNotFound(String),

    #[error("Value of {field} already exists")]
    UniqueViolation { field: String },

    #[error("Review for this title already exists")]
    DuplicateReview,

    #[error("Invalid stored value: {0}")]
    InvalidData(String),
}

/// Extracts column names from SQLite message like `UNIQUE constraint failed: users.email`
fn unique_field(message: &str) -> String {
    message
        .rsplit_once(": ")
        .map(|(_, columns)| {
            columns
                .split(", ")
                .map(|c| c.rsplit_once('.').map(|(_, col)| col).unwrap_or(c))
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_else(|| "non_field_errors".to_string())
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Error::RecordNotFound("Record".to_string()),
            sqlx::Error::Database(ref e) if e.is_unique_violation() => Error::UniqueViolation {
                field: unique_field(e.message()),
            },
            other => Error::DatabaseError(other),
        }
    }
}

/// Turns missing record into `None`, keeping other errors
pub trait OptionalRecord<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalRecord<T> for Result<T> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(Error::RecordNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
