#![allow(dead_code)]

use anyhow::Result;
use timesheet::contract::model::NewUser;
use timesheet::create_schema;
use worktrack_db::{ConnectOpts, DbHandle};

/// Fresh in-memory database with the full schema.
pub async fn setup() -> Result<DbHandle> {
    let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
    create_schema(&*db.sea()).await?;
    Ok(db)
}

pub fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        full_name: name.to_string(),
        email: email.to_string(),
        hashed_password: "$argon2id$test".to_string(),
        is_admin: false,
        role: None,
    }
}
