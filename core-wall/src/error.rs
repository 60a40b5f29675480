use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("This URL has already been posted: {url}")]
    DuplicateUrl { url: String },

    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

impl LibraryError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity_type: &str, id: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;

/// Map a UNIQUE violation on `albums.url` to [`LibraryError::DuplicateUrl`].
pub(crate) fn map_url_conflict(error: sqlx::Error, url: &str) -> LibraryError {
    if let sqlx::Error::Database(ref db_error) = error {
        if db_error.is_unique_violation() {
            return LibraryError::DuplicateUrl {
                url: url.to_string(),
            };
        }
    }
    LibraryError::Database(error)
}
