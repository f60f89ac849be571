use chrono::Utc;
use sea_orm::{ColumnTrait, Set};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};
use worktrack_db::{DbSession, Lookup, Repository};

use crate::contract::model::{NewSession, Session};
use crate::domain::error::DomainError;
use crate::infra::storage::entities::sessions;

const SESSIONS: Repository<sessions::Entity> = Repository::new();

/// SHA-256 of a token, lowercase hex. Raw tokens are never stored.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Login sessions keyed by token digests.
#[derive(Default)]
pub struct SessionService;

impl SessionService {
    pub fn new() -> Self {
        Self
    }

    #[instrument(name = "timesheet.sessions.create", skip(self, session, new_session), fields(user_id = %new_session.user_id))]
    pub async fn create_session(
        &self,
        session: &DbSession,
        new_session: NewSession,
    ) -> Result<Session, DomainError> {
        let am = sessions::ActiveModel {
            refresh_token_hash: Set(hash_token(&new_session.refresh_token)),
            access_token_hash: Set(hash_token(&new_session.access_token)),
            expires_at: Set(new_session.expires_at),
            device_name: Set(new_session.device_name),
            device_type: Set(new_session.device_type),
            ip_address: Set(new_session.ip_address),
            user_agent: Set(new_session.user_agent),
            user_id: Set(new_session.user_id),
            ..Default::default()
        };
        let model = SESSIONS.create(session, am.into(), true).await?;
        info!(session_id = %model.id, "session opened");
        Ok(model.into())
    }

    /// Active, unexpired session for a refresh token.
    #[instrument(name = "timesheet.sessions.find_active", skip_all)]
    pub async fn find_active(
        &self,
        session: &DbSession,
        refresh_token: &str,
    ) -> Result<Option<Session>, DomainError> {
        let lookup = Lookup::by(sessions::Column::RefreshTokenHash, hash_token(refresh_token))
            .and(sessions::Column::IsActive.eq(true))
            .and(sessions::Column::ExpiresAt.gt(Utc::now()));
        Ok(SESSIONS.find_one(session, &lookup).await?.map(Session::from))
    }

    /// Deactivate the session holding this refresh token; unknown tokens are ignored.
    #[instrument(name = "timesheet.sessions.logout", skip_all)]
    pub async fn logout(&self, session: &DbSession, refresh_token: &str) -> Result<(), DomainError> {
        let patch = sessions::ActiveModel {
            is_active: Set(false),
            ..Default::default()
        };
        SESSIONS
            .update_many_by_whereclause(
                session,
                patch.into(),
                &[
                    sessions::Column::RefreshTokenHash.eq(hash_token(refresh_token)),
                    sessions::Column::IsActive.eq(true),
                ],
                true,
            )
            .await?;
        debug!("logout processed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_sha256_hex() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_token("").len(), 64);
        assert_ne!(hash_token("a"), hash_token("b"));
    }
}
