use sea_orm::{ActiveValue, ColumnTrait, Set};
use tracing::{debug, info, instrument};
use uuid::Uuid;
use worktrack_db::{
    Criteria, DbSession, Lookup, PageRequest, Paginated, PaginationFactory, QuerySchema,
    Repository, UpsertOptions,
};

use crate::contract::model::{NewUser, User};
use crate::domain::error::DomainError;
use crate::infra::storage::entities::users;

const USERS: Repository<users::Entity> = Repository::new();

/// Accounts. Password hashing happens upstream; only the hash arrives here.
pub struct UserService {
    query: QuerySchema<users::Entity>,
}

impl Default for UserService {
    fn default() -> Self {
        Self::new()
    }
}

impl UserService {
    pub fn new() -> Self {
        Self {
            query: PaginationFactory::create::<users::Entity>(
                &["hashed_password"],
                &["hashed_password"],
            ),
        }
    }

    #[instrument(name = "timesheet.users.register", skip(self, session, new_user), fields(email = %new_user.email))]
    pub async fn register(&self, session: &DbSession, new_user: NewUser) -> Result<User, DomainError> {
        let email = new_user.email.clone();
        match USERS.create(session, active_model(new_user).into(), true).await {
            Ok(model) => {
                info!(user_id = %model.id, "user registered");
                Ok(model.into())
            }
            Err(err) if err.is_unique_violation() => Err(DomainError::EmailAlreadyExists { email }),
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(name = "timesheet.users.get", skip(self, session))]
    pub async fn get(&self, session: &DbSession, id: Uuid) -> Result<User, DomainError> {
        Ok(USERS.get_one(session, &Lookup::id(id)).await?.into())
    }

    #[instrument(name = "timesheet.users.find_by_email", skip(self, session))]
    pub async fn find_by_email(
        &self,
        session: &DbSession,
        email: &str,
    ) -> Result<Option<User>, DomainError> {
        let lookup = Lookup::by(users::Column::Email, email);
        Ok(USERS.find_one(session, &lookup).await?.map(User::from))
    }

    #[instrument(name = "timesheet.users.list", skip(self, session, req), fields(page = req.page, size = req.size))]
    pub async fn list(&self, session: &DbSession, req: PageRequest) -> Result<Paginated<User>, DomainError> {
        let query = self.query.bind(req)?;
        let page = USERS.get_many(session, Some(&query), &Criteria::new()).await?;
        debug!(total = page.total_records, "users listed");
        Ok(page.map_items(User::from))
    }

    /// Insert or refresh the account with this email; used for seeding.
    #[instrument(name = "timesheet.users.upsert_by_email", skip(self, session, new_user), fields(email = %new_user.email))]
    pub async fn upsert_by_email(&self, session: &DbSession, new_user: NewUser) -> Result<User, DomainError> {
        let options = UpsertOptions::on([users::Column::Email]);
        let model = USERS
            .upsert_one(session, active_model(new_user).into(), &options, true)
            .await?;
        Ok(model.into())
    }

    /// Deactivated accounts keep their rows; sessions are left to expire.
    #[instrument(name = "timesheet.users.deactivate", skip(self, session))]
    pub async fn deactivate(&self, session: &DbSession, id: Uuid) -> Result<User, DomainError> {
        let patch = users::ActiveModel {
            is_active: Set(false),
            ..Default::default()
        };
        let model = USERS
            .update_one(session, patch.into(), &[users::Column::Id.eq(id)], true)
            .await?;
        Ok(model.into())
    }
}

fn active_model(new_user: NewUser) -> users::ActiveModel {
    users::ActiveModel {
        full_name: Set(new_user.full_name),
        email: Set(new_user.email),
        hashed_password: Set(new_user.hashed_password),
        is_admin: Set(new_user.is_admin),
        role: new_user.role.map_or(ActiveValue::NotSet, Set),
        ..Default::default()
    }
}
