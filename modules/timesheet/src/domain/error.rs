use chrono::NaiveDate;
use query_core::QueryError;
use thiserror::Error;
use uuid::Uuid;
use worktrack_db::RepoError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("User with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    #[error("Activity with code '{code}' already exists")]
    ActivityCodeExists { code: String },

    #[error("User {user_id} is already assigned to activity {activity_id}")]
    AlreadyAssigned { user_id: Uuid, activity_id: Uuid },

    #[error("Task '{title}' already exists in this activity")]
    TaskAlreadyExists { title: String },

    #[error("User {user_id} is not assigned to activity {activity_id}")]
    NotAssigned { user_id: Uuid, activity_id: Uuid },

    #[error("Worklog {id} belongs to another user")]
    WorklogNotOwned { id: Uuid },

    #[error("Invalid worklog entry: {message}")]
    InvalidWorklog { message: String },

    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Daily limit exceeded: {}", format_totals(.totals))]
    DailyLimitExceeded { totals: Vec<(NaiveDate, f64)> },

    #[error("Referenced record does not exist: {message}")]
    InvalidReference { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    #[error("Database error: {message}")]
    Database { message: String },
}

fn format_totals(totals: &[(NaiveDate, f64)]) -> String {
    totals
        .iter()
        .map(|(date, hours)| format!("{date} ({hours}h)"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn invalid_worklog(message: impl Into<String>) -> Self {
        Self::InvalidWorklog {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

/// Generic translation; services map the unique violations they can name
/// more precisely before falling back to this.
impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { entity } => Self::NotFound { entity },
            RepoError::UniqueViolation(message) => Self::Conflict { message },
            RepoError::ForeignKeyViolation(message) => Self::InvalidReference { message },
            RepoError::Query(q) => Self::InvalidQuery(q),
            other => Self::database(other.to_string()),
        }
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(err: sea_orm::DbErr) -> Self {
        RepoError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_limit_message_lists_dates() {
        let d1 = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
        let err = DomainError::DailyLimitExceeded {
            totals: vec![(d1, 9.0), (d2, 10.5)],
        };
        assert_eq!(
            err.to_string(),
            "Daily limit exceeded: 2024-05-06 (9h), 2024-05-07 (10.5h)"
        );
    }

    #[test]
    fn test_repo_errors_are_classified() {
        assert!(matches!(
            DomainError::from(RepoError::UniqueViolation("dup".into())),
            DomainError::Conflict { .. }
        ));
        assert!(matches!(
            DomainError::from(RepoError::ForeignKeyViolation("fk".into())),
            DomainError::InvalidReference { .. }
        ));
        assert!(matches!(
            DomainError::from(RepoError::not_found("todo")),
            DomainError::NotFound { entity: "todo" }
        ));
        assert!(matches!(
            DomainError::from(RepoError::UpsertInvalid),
            DomainError::Database { .. }
        ));
    }
}
