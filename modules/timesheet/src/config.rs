use serde::{Deserialize, Serialize};

/// Module settings, read from `modules.timesheet` of the application config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimesheetConfig {
    /// Maximum hours a user may log on one date, across all tasks.
    pub daily_hours_limit: f64,
    /// Row cap for unpaginated lists.
    pub page_size: u64,
    /// Rows per INSERT for bulk writes.
    pub batch_size: usize,
}

impl Default for TimesheetConfig {
    fn default() -> Self {
        Self {
            daily_hours_limit: 8.0,
            page_size: 20,
            batch_size: 100,
        }
    }
}
