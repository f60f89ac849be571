//! Time-tracking domain: users and sessions, activities with their tasks and
//! worklogs, and personal todo lists.
//!
//! Services in [`domain`] run on a caller-supplied [`worktrack_db::DbSession`];
//! [`gateways::local::TimesheetLocalClient`] wraps them with one session per
//! call and the public [`contract`] error type.

pub mod config;
pub mod contract;
pub mod domain;
pub mod gateways;
pub mod infra;

pub use config::TimesheetConfig;
pub use infra::storage::schema::create_schema;
