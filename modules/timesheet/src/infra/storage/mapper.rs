use crate::contract::model::{
    Activity, ActivityTask, ActivityType, ActivityWithType, Assignment, JournalWorklog, Session,
    Subtask, Todo, User, Worklog,
};
use crate::infra::storage::entities::{
    activities, activity_tasks, activity_types, activity_users, sessions, subtasks, todos, users,
    worklogs,
};

impl From<users::Model> for User {
    fn from(m: users::Model) -> Self {
        Self {
            id: m.id,
            full_name: m.full_name,
            email: m.email,
            is_active: m.is_active,
            is_admin: m.is_admin,
            role: m.role,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<activity_types::Model> for ActivityType {
    fn from(m: activity_types::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
        }
    }
}

impl From<activities::Model> for Activity {
    fn from(m: activities::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            code: m.code,
            expected_hours_monthly: m.expected_hours_monthly,
            activity_type_id: m.activity_type_id,
        }
    }
}

/// Join an activity with its (already loaded) type.
pub fn activity_with_type(
    activity: activities::Model,
    activity_type: activity_types::Model,
) -> ActivityWithType {
    ActivityWithType {
        id: activity.id,
        title: activity.title,
        code: activity.code,
        expected_hours_monthly: activity.expected_hours_monthly,
        activity_type: activity_type.into(),
    }
}

impl From<activity_users::Model> for Assignment {
    fn from(m: activity_users::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            activity_id: m.activity_id,
            assigned_by_id: m.assigned_by_id,
        }
    }
}

impl From<activity_tasks::Model> for ActivityTask {
    fn from(m: activity_tasks::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            activity_id: m.activity_id,
            user_id: m.user_id,
        }
    }
}

impl From<worklogs::Model> for Worklog {
    fn from(m: worklogs::Model) -> Self {
        Self {
            id: m.id,
            date: m.date,
            duration: m.duration,
            activity_task_id: m.activity_task_id,
            user_id: m.user_id,
        }
    }
}

impl From<worklogs::Model> for JournalWorklog {
    fn from(m: worklogs::Model) -> Self {
        Self {
            id: m.id,
            date: m.date,
            duration: m.duration,
        }
    }
}

impl From<subtasks::Model> for Subtask {
    fn from(m: subtasks::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            priority: m.priority,
        }
    }
}

/// Subtasks are ordered by priority, highest first.
pub fn todo_with_subtasks(todo: todos::Model, subtasks: Vec<subtasks::Model>) -> Todo {
    let mut subtasks: Vec<Subtask> = subtasks.into_iter().map(Subtask::from).collect();
    subtasks.sort_by(|a, b| b.priority.cmp(&a.priority));
    Todo {
        id: todo.id,
        title: todo.title,
        user_id: todo.user_id,
        subtasks,
    }
}

impl From<sessions::Model> for Session {
    fn from(m: sessions::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            is_active: m.is_active,
            expires_at: m.expires_at,
            last_used_at: m.last_used_at,
            device_name: m.device_name,
            device_type: m.device_type,
            ip_address: m.ip_address,
            user_agent: m.user_agent,
        }
    }
}
