use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use tracing::{error, warn};
use uuid::Uuid;
use worktrack_db::DbSession;

use crate::config::TimesheetConfig;
use crate::contract::{
    client::TimesheetApi,
    error::TimesheetError,
    model::{
        Activity, ActivityTask, ActivityType, ActivityWithType, Assignment, Journal, NewActivity,
        NewSession, NewTodo, NewUser, PageRequest, Paginated, Session, Todo, User, Worklog,
        WorklogEntry,
    },
};
use crate::domain::{
    activities::ActivityService, error::DomainError, sessions::SessionService,
    todos::TodoService, users::UserService,
};

/// In-process implementation of [`TimesheetApi`]: one session per call,
/// committed when the service succeeds and discarded otherwise.
pub struct TimesheetLocalClient {
    conn: Arc<DatabaseConnection>,
    users: UserService,
    activities: ActivityService,
    todos: TodoService,
    sessions: SessionService,
}

impl TimesheetLocalClient {
    pub fn new(conn: Arc<DatabaseConnection>, config: TimesheetConfig) -> Self {
        Self {
            conn,
            users: UserService::new(),
            activities: ActivityService::new(config.clone()),
            todos: TodoService::new(config),
            sessions: SessionService::new(),
        }
    }

    fn session(&self) -> DbSession {
        DbSession::new(Arc::clone(&self.conn))
    }
}

async fn complete<T>(session: DbSession, result: Result<T, DomainError>) -> Result<T, TimesheetError> {
    match result {
        Ok(value) => {
            session.commit().await.map_err(|e| {
                error!(error = %e, "commit failed");
                TimesheetError::internal()
            })?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rb) = session.close().await {
                warn!(error = %rb, "failed to close session");
            }
            Err(err.into())
        }
    }
}

#[async_trait]
impl TimesheetApi for TimesheetLocalClient {
    async fn register_user(&self, new_user: NewUser) -> Result<User, TimesheetError> {
        let session = self.session();
        let result = self.users.register(&session, new_user).await;
        complete(session, result).await
    }

    async fn get_user(&self, id: Uuid) -> Result<User, TimesheetError> {
        let session = self.session();
        let result = self.users.get(&session, id).await;
        complete(session, result).await
    }

    async fn list_users(&self, req: PageRequest) -> Result<Paginated<User>, TimesheetError> {
        let session = self.session();
        let result = self.users.list(&session, req).await;
        complete(session, result).await
    }

    async fn activity_types(&self) -> Result<Vec<ActivityType>, TimesheetError> {
        let session = self.session();
        let result = self.activities.activity_types(&session).await;
        complete(session, result).await
    }

    async fn list_activities(
        &self,
        req: PageRequest,
    ) -> Result<Paginated<Activity>, TimesheetError> {
        let session = self.session();
        let result = self.activities.list_activities(&session, req).await;
        complete(session, result).await
    }

    async fn create_activity(&self, new_activity: NewActivity) -> Result<Activity, TimesheetError> {
        let session = self.session();
        let result = self.activities.create_activity(&session, new_activity).await;
        complete(session, result).await
    }

    async fn assign_user(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> Result<Assignment, TimesheetError> {
        let session = self.session();
        let result = self
            .activities
            .assign_user(&session, user_id, activity_id, assigned_by)
            .await;
        complete(session, result).await
    }

    async fn activities_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ActivityWithType>, TimesheetError> {
        let session = self.session();
        let result = self.activities.activities_for_user(&session, user_id).await;
        complete(session, result).await
    }

    async fn add_task(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
        title: String,
    ) -> Result<ActivityTask, TimesheetError> {
        let session = self.session();
        let result = self
            .activities
            .add_task(&session, user_id, activity_id, title)
            .await;
        complete(session, result).await
    }

    async fn tasks_for_user(&self, user_id: Uuid) -> Result<Vec<ActivityTask>, TimesheetError> {
        let session = self.session();
        let result = self.activities.tasks_for_user(&session, user_id).await;
        complete(session, result).await
    }

    async fn journal(
        &self,
        user_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Journal, TimesheetError> {
        let session = self.session();
        let result = self
            .activities
            .journal(&session, user_id, start_date, end_date)
            .await;
        complete(session, result).await
    }

    async fn batch_worklog(
        &self,
        user_id: Uuid,
        entries: Vec<WorklogEntry>,
    ) -> Result<Vec<Worklog>, TimesheetError> {
        let session = self.session();
        let result = self
            .activities
            .batch_worklog(&session, user_id, entries)
            .await;
        complete(session, result).await
    }

    async fn todos(&self, user_id: Uuid) -> Result<Vec<Todo>, TimesheetError> {
        let session = self.session();
        let result = self.todos.todos(&session, user_id).await;
        complete(session, result).await
    }

    async fn create_todo(&self, user_id: Uuid, new_todo: NewTodo) -> Result<Todo, TimesheetError> {
        let session = self.session();
        let result = self.todos.create_todo(&session, user_id, new_todo).await;
        complete(session, result).await
    }

    async fn delete_todo(&self, user_id: Uuid, id: Uuid) -> Result<(), TimesheetError> {
        let session = self.session();
        let result = self.todos.delete_todo(&session, user_id, id).await;
        complete(session, result).await
    }

    async fn create_session(&self, new_session: NewSession) -> Result<Session, TimesheetError> {
        let session = self.session();
        let result = self.sessions.create_session(&session, new_session).await;
        complete(session, result).await
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), TimesheetError> {
        let session = self.session();
        let result = self.sessions.logout(&session, refresh_token).await;
        complete(session, result).await
    }
}
