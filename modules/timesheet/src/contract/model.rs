use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

pub use worktrack_db::{PageRequest, Paginated};

/// Account as exposed to other modules; the password hash never leaves storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for registering a user. `hashed_password` is produced by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub hashed_password: String,
    pub is_admin: bool,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityType {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id: Uuid,
    pub title: String,
    pub code: String,
    pub expected_hours_monthly: i32,
    pub activity_type_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub title: String,
    pub code: String,
    pub expected_hours_monthly: i32,
    pub activity_type_id: Uuid,
}

/// An activity together with its type, as listed for an assigned user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityWithType {
    pub id: Uuid,
    pub title: String,
    pub code: String,
    pub expected_hours_monthly: i32,
    pub activity_type: ActivityType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Uuid,
    pub assigned_by_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityTask {
    pub id: Uuid,
    pub title: String,
    pub activity_id: Uuid,
    pub user_id: Option<Uuid>,
}

/// One cell of the weekly grid.
///
/// - no `id`: create a worklog (a `duration` is required)
/// - `id` and a non-zero `duration`: update it
/// - `id` and no or zero `duration`: delete it
#[derive(Debug, Clone, PartialEq)]
pub struct WorklogEntry {
    pub id: Option<Uuid>,
    pub date: NaiveDate,
    pub duration: Option<f64>,
    pub task_id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Worklog {
    pub id: Uuid,
    pub date: NaiveDate,
    pub duration: f64,
    pub activity_task_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JournalWorklog {
    pub id: Uuid,
    pub date: NaiveDate,
    pub duration: f64,
}

/// A user's task with the worklogs that fall inside the journal range.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalTask {
    pub id: Uuid,
    pub title: String,
    pub activity_id: Uuid,
    pub worklogs: Vec<JournalWorklog>,
}

/// Everything the weekly grid shows for one user and date range.
///
/// `project_assignments` holds each activity the user has tasks in, once,
/// newest task first; `tasks` follows the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct Journal {
    pub project_assignments: Vec<ActivityWithType>,
    pub tasks: Vec<JournalTask>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtask {
    pub id: Uuid,
    pub title: Option<String>,
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub user_id: Uuid,
    pub subtasks: Vec<Subtask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewSubtask {
    pub title: Option<String>,
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub subtasks: Vec<NewSubtask>,
}

/// Raw tokens issued at login; only their digests are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
