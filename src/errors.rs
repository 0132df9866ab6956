use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Invalid document ID: {0}")]
    InvalidDocumentId(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("BSON: {0}")]
    Bson(String),

    #[error("Query error: {0}")]
    QueryError(String),
}

impl From<bson::ser::Error> for DbError {
    fn from(e: bson::ser::Error) -> Self {
        Self::Bson(e.to_string())
    }
}

impl DbError {
    /// True when the caller supplied something the store can never accept.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidDocumentId(_))
    }
}
