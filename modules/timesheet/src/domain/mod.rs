//! Business services. Each method takes the caller's [`DbSession`]; reads
//! leave its transaction open, writes commit unless they are part of a larger
//! unit that the service finalizes itself.

pub mod activities;
pub mod error;
pub mod sessions;
pub mod todos;
pub mod users;

use worktrack_db::DbSession;

use self::error::DomainError;

/// Commit a multi-statement unit on success, roll it back otherwise.
pub(crate) async fn finish_unit<T>(
    session: &DbSession,
    result: Result<T, DomainError>,
) -> Result<T, DomainError> {
    match result {
        Ok(value) => {
            session.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rb) = session.rollback().await {
                tracing::warn!(error = %rb, "rollback failed after error: {err}");
            }
            Err(err)
        }
    }
}
