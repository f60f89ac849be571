use query_core::QueryError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

pub type RepoResult<T> = std::result::Result<T, RepoError>;

/// Failures of repository operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("refusing to run '{op}' without predicates")]
    MissingPredicates { op: &'static str },

    #[error("upsert payload is missing index fields: {missing:?}")]
    MissingIndexField { missing: Vec<String> },

    #[error("upsert payload must contain at least one non-index field")]
    UpsertInvalid,

    #[error("payload for '{op}' is missing the primary key")]
    MissingKey { op: &'static str },

    #[error("nothing to write: payload has no fields")]
    EmptyPayload,

    #[error("unknown field '{field}' in payload")]
    UnknownField { field: String },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("database error: {0}")]
    Db(DbErr),
}

impl RepoError {
    pub fn not_found(entity: &'static str) -> Self {
        RepoError::NotFound { entity }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepoError::NotFound { .. })
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, RepoError::UniqueViolation(_))
    }
}

impl From<DbErr> for RepoError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => RepoError::UniqueViolation(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                RepoError::ForeignKeyViolation(msg)
            }
            _ => RepoError::Db(err),
        }
    }
}
