use crate::domain::repositories::RepositoryError;

const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return RepositoryError::Duplicate(duplicate_field(db.constraint()).to_string());
            }
        }
        tracing::error!(error = %err, "database operation failed");
        RepositoryError::Database(err.to_string())
    }
}

/// Maps a unique constraint name to the field it guards
fn duplicate_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(name) if name.contains("username") => "username",
        Some(name) if name.contains("email") => "email",
        Some(name) if name.contains("sku") => "sku",
        _ => "record",
    }
}
