//! SeaORM entities for every timesheet table and their [`Resource`] bindings.
//!
//! [`Resource`]: worktrack_db::Resource

pub mod activities;
pub mod activity_tasks;
pub mod activity_types;
pub mod activity_users;
pub mod sessions;
pub mod subtasks;
pub mod todos;
pub mod users;
pub mod worklogs;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait};
use uuid::Uuid;

type ColumnOf<A> = <<A as ActiveModelTrait>::Entity as EntityTrait>::Column;

/// Generate the id when absent, set `created_at` when absent, always refresh `updated_at`.
pub(crate) fn stamp_insert<A: ActiveModelTrait>(
    am: &mut A,
    id: ColumnOf<A>,
    created_at: ColumnOf<A>,
    updated_at: ColumnOf<A>,
) {
    let now = Utc::now();
    if am.get(id).is_not_set() {
        am.set(id, Uuid::new_v4().into());
    }
    if am.get(created_at).is_not_set() {
        am.set(created_at, now.into());
    }
    am.set(updated_at, now.into());
}
