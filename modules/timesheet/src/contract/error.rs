use thiserror::Error;

use crate::domain::error::DomainError;

/// Errors that are safe to expose to other modules and transports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimesheetError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Internal error")]
    Internal,
}

impl TimesheetError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<DomainError> for TimesheetError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::NotFound { .. } => Self::not_found(message),
            DomainError::EmailAlreadyExists { .. }
            | DomainError::ActivityCodeExists { .. }
            | DomainError::AlreadyAssigned { .. }
            | DomainError::TaskAlreadyExists { .. }
            | DomainError::Conflict { .. } => Self::conflict(message),
            DomainError::NotAssigned { .. } | DomainError::WorklogNotOwned { .. } => {
                Self::forbidden(message)
            }
            DomainError::InvalidWorklog { .. }
            | DomainError::InvalidDateRange { .. }
            | DomainError::DailyLimitExceeded { .. }
            | DomainError::InvalidReference { .. }
            | DomainError::InvalidQuery(_) => Self::bad_request(message),
            DomainError::Database { .. } => {
                tracing::error!(error = %message, "storage failure");
                Self::internal()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_domain_errors_map_to_public_kinds() {
        let id = Uuid::new_v4();
        assert_eq!(
            TimesheetError::from(DomainError::not_found("todo")),
            TimesheetError::not_found("todo not found")
        );
        assert!(matches!(
            TimesheetError::from(DomainError::EmailAlreadyExists {
                email: "a@b.c".into()
            }),
            TimesheetError::Conflict { .. }
        ));
        assert!(matches!(
            TimesheetError::from(DomainError::NotAssigned {
                user_id: id,
                activity_id: id
            }),
            TimesheetError::Forbidden { .. }
        ));
        assert!(matches!(
            TimesheetError::from(DomainError::DailyLimitExceeded { totals: vec![] }),
            TimesheetError::BadRequest { .. }
        ));
        assert_eq!(
            TimesheetError::from(DomainError::database("connection reset")),
            TimesheetError::Internal
        );
    }
}
