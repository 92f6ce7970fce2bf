use thiserror::Error;

#[derive(Error, Debug)]
pub enum KanbanError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(String),

    /// The backing store has no column for a field the write tried to touch.
    #[error("Schema is missing column `{column}`")]
    SchemaMissing { column: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl KanbanError {
    /// True when the error reports an absent column with the given name.
    pub fn is_missing_column(&self, name: &str) -> bool {
        matches!(self, Self::SchemaMissing { column } if column == name)
    }
}

impl From<serde_json::Error> for KanbanError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
