use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::contract::error::TimesheetError;
use crate::contract::model::{
    Activity, ActivityTask, ActivityType, ActivityWithType, Assignment, Journal, NewActivity,
    NewSession, NewTodo, NewUser, PageRequest, Paginated, Session, Todo, User, Worklog,
    WorklogEntry,
};

/// Public API of the timesheet module. Each call is its own unit of work.
#[async_trait]
pub trait TimesheetApi: Send + Sync {
    async fn register_user(&self, new_user: NewUser) -> Result<User, TimesheetError>;

    async fn get_user(&self, id: Uuid) -> Result<User, TimesheetError>;

    async fn list_users(&self, req: PageRequest) -> Result<Paginated<User>, TimesheetError>;

    async fn activity_types(&self) -> Result<Vec<ActivityType>, TimesheetError>;

    async fn list_activities(&self, req: PageRequest)
        -> Result<Paginated<Activity>, TimesheetError>;

    async fn create_activity(&self, new_activity: NewActivity)
        -> Result<Activity, TimesheetError>;

    /// Admin operation: let `user_id` track time on `activity_id`.
    async fn assign_user(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> Result<Assignment, TimesheetError>;

    async fn activities_for_user(&self, user_id: Uuid)
        -> Result<Vec<ActivityWithType>, TimesheetError>;

    async fn add_task(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
        title: String,
    ) -> Result<ActivityTask, TimesheetError>;

    async fn tasks_for_user(&self, user_id: Uuid) -> Result<Vec<ActivityTask>, TimesheetError>;

    /// Tasks, activities and worklogs of `user_id` between two dates, inclusive.
    async fn journal(
        &self,
        user_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Journal, TimesheetError>;

    /// Apply a batch of worklog cells atomically; see [`WorklogEntry`].
    async fn batch_worklog(
        &self,
        user_id: Uuid,
        entries: Vec<WorklogEntry>,
    ) -> Result<Vec<Worklog>, TimesheetError>;

    async fn todos(&self, user_id: Uuid) -> Result<Vec<Todo>, TimesheetError>;

    async fn create_todo(&self, user_id: Uuid, new_todo: NewTodo) -> Result<Todo, TimesheetError>;

    async fn delete_todo(&self, user_id: Uuid, id: Uuid) -> Result<(), TimesheetError>;

    async fn create_session(&self, new_session: NewSession) -> Result<Session, TimesheetError>;

    async fn logout(&self, refresh_token: &str) -> Result<(), TimesheetError>;
}
