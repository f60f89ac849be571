use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, Order, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use worktrack_db::{
    Criteria, DbSession, Lookup, PageRequest, Paginated, PaginationFactory, Payload, QuerySchema,
    Repository, UpsertOptions,
};

use crate::config::TimesheetConfig;
use crate::contract::model::{
    Activity, ActivityTask, ActivityType, ActivityWithType, Assignment, Journal, JournalTask,
    JournalWorklog, NewActivity, Worklog, WorklogEntry,
};
use crate::domain::error::DomainError;
use crate::domain::finish_unit;
use crate::infra::storage::entities::{
    activities, activity_tasks, activity_types, activity_users, worklogs,
};
use crate::infra::storage::mapper::activity_with_type;
use crate::infra::storage::schema::{WORKLOG_MAX_HOURS, WORKLOG_MIN_HOURS};

const ACTIVITY_TYPES: Repository<activity_types::Entity> = Repository::new();
const ACTIVITIES: Repository<activities::Entity> = Repository::new();
const ASSIGNMENTS: Repository<activity_users::Entity> = Repository::new();
const TASKS: Repository<activity_tasks::Entity> = Repository::new();
const WORKLOGS: Repository<worklogs::Entity> = Repository::new();

#[derive(Debug, FromQueryResult)]
struct DayTotal {
    date: NaiveDate,
    total: f64,
}

/// Activities, their user assignments, tasks and worklogs.
pub struct ActivityService {
    config: TimesheetConfig,
    query: QuerySchema<activities::Entity>,
}

impl ActivityService {
    pub fn new(config: TimesheetConfig) -> Self {
        Self {
            config,
            query: PaginationFactory::create::<activities::Entity>(&[], &[]),
        }
    }

    #[instrument(name = "timesheet.activities.activity_types", skip(self, session))]
    pub async fn activity_types(&self, session: &DbSession) -> Result<Vec<ActivityType>, DomainError> {
        let criteria = Criteria::new()
            .order_by(activity_types::Column::Title, Order::Asc)
            .limit(self.config.page_size);
        let rows = ACTIVITY_TYPES.get_all(session, &criteria).await?;
        Ok(rows.into_iter().map(ActivityType::from).collect())
    }

    /// Seed helper: insert the titles that do not exist yet, return all of them.
    #[instrument(name = "timesheet.activities.ensure_activity_types", skip(self, session))]
    pub async fn ensure_activity_types(
        &self,
        session: &DbSession,
        titles: &[&str],
    ) -> Result<Vec<ActivityType>, DomainError> {
        let payloads = titles
            .iter()
            .map(|title| {
                Payload::from(activity_types::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    title: Set((*title).to_string()),
                    ..Default::default()
                })
            })
            .collect();
        let options = UpsertOptions::on([activity_types::Column::Title]).do_nothing();
        let rows = ACTIVITY_TYPES
            .upsert_many(session, payloads, &options, true)
            .await?;
        Ok(rows.into_iter().map(ActivityType::from).collect())
    }

    #[instrument(name = "timesheet.activities.list", skip(self, session, req), fields(page = req.page, size = req.size))]
    pub async fn list_activities(
        &self,
        session: &DbSession,
        req: PageRequest,
    ) -> Result<Paginated<Activity>, DomainError> {
        let query = self.query.bind(req)?;
        let page = ACTIVITIES
            .get_many(session, Some(&query), &Criteria::new())
            .await?;
        Ok(page.map_items(Activity::from))
    }

    #[instrument(name = "timesheet.activities.create", skip(self, session, new_activity), fields(code = %new_activity.code))]
    pub async fn create_activity(
        &self,
        session: &DbSession,
        new_activity: NewActivity,
    ) -> Result<Activity, DomainError> {
        let code = new_activity.code.clone();
        let am = activities::ActiveModel {
            title: Set(new_activity.title),
            code: Set(new_activity.code),
            expected_hours_monthly: Set(new_activity.expected_hours_monthly),
            activity_type_id: Set(new_activity.activity_type_id),
            ..Default::default()
        };
        match ACTIVITIES.create(session, am.into(), true).await {
            Ok(model) => {
                info!(activity_id = %model.id, "activity created");
                Ok(model.into())
            }
            Err(err) if err.is_unique_violation() => Err(DomainError::ActivityCodeExists { code }),
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(name = "timesheet.activities.assign_user", skip(self, session))]
    pub async fn assign_user(
        &self,
        session: &DbSession,
        user_id: Uuid,
        activity_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> Result<Assignment, DomainError> {
        let am = activity_users::ActiveModel {
            user_id: Set(user_id),
            activity_id: Set(activity_id),
            assigned_by_id: Set(assigned_by),
            ..Default::default()
        };
        match ASSIGNMENTS.create(session, am.into(), true).await {
            Ok(model) => {
                info!(assignment_id = %model.id, "user assigned");
                Ok(model.into())
            }
            Err(err) if err.is_unique_violation() => Err(DomainError::AlreadyAssigned {
                user_id,
                activity_id,
            }),
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(name = "timesheet.activities.for_user", skip(self, session))]
    pub async fn activities_for_user(
        &self,
        session: &DbSession,
        user_id: Uuid,
    ) -> Result<Vec<ActivityWithType>, DomainError> {
        let assigned = ASSIGNMENTS
            .get_all(
                session,
                &Criteria::new()
                    .filter(activity_users::Column::UserId.eq(user_id))
                    .unbounded(),
            )
            .await?;
        if assigned.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = assigned.iter().map(|a| a.activity_id).collect();
        let rows = ACTIVITIES
            .get_all_with_parent::<activity_types::Entity>(
                session,
                &Criteria::new()
                    .filter(activities::Column::Id.is_in(ids))
                    .order_by(activities::Column::Title, Order::Asc)
                    .unbounded(),
            )
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(activity, kind)| kind.map(|k| activity_with_type(activity, k)))
            .collect())
    }

    /// `NotAssigned` unless the user may track time on the activity.
    #[instrument(name = "timesheet.activities.ensure_assigned", skip(self, session))]
    pub async fn ensure_assigned(
        &self,
        session: &DbSession,
        user_id: Uuid,
        activity_id: Uuid,
    ) -> Result<(), DomainError> {
        let lookup = Lookup::by(activity_users::Column::UserId, user_id)
            .and(activity_users::Column::ActivityId.eq(activity_id));
        if ASSIGNMENTS.exists(session, &lookup, false).await? {
            Ok(())
        } else {
            Err(DomainError::NotAssigned {
                user_id,
                activity_id,
            })
        }
    }

    #[instrument(name = "timesheet.activities.tasks_for_user", skip(self, session))]
    pub async fn tasks_for_user(
        &self,
        session: &DbSession,
        user_id: Uuid,
    ) -> Result<Vec<ActivityTask>, DomainError> {
        let criteria = Criteria::new()
            .filter(activity_tasks::Column::UserId.eq(user_id))
            .order_by(activity_tasks::Column::Title, Order::Asc)
            .unbounded();
        let rows = TASKS.get_all(session, &criteria).await?;
        Ok(rows.into_iter().map(ActivityTask::from).collect())
    }

    #[instrument(name = "timesheet.activities.add_task", skip(self, session))]
    pub async fn add_task(
        &self,
        session: &DbSession,
        user_id: Uuid,
        activity_id: Uuid,
        title: String,
    ) -> Result<ActivityTask, DomainError> {
        let title = title.trim().to_string();
        self.ensure_assigned(session, user_id, activity_id).await?;

        let am = activity_tasks::ActiveModel {
            title: Set(title.clone()),
            activity_id: Set(activity_id),
            user_id: Set(Some(user_id)),
            ..Default::default()
        };
        match TASKS.create(session, am.into(), true).await {
            Ok(model) => Ok(model.into()),
            Err(err) if err.is_unique_violation() => Err(DomainError::TaskAlreadyExists { title }),
            Err(err) => Err(err.into()),
        }
    }

    /// The user's tasks, the activities they belong to and the worklogs logged
    /// between `start` and `end` inclusive.
    #[instrument(name = "timesheet.activities.journal", skip(self, session))]
    pub async fn journal(
        &self,
        session: &DbSession,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Journal, DomainError> {
        if start > end {
            return Err(DomainError::InvalidDateRange { start, end });
        }

        let tasks = TASKS
            .get_all_with::<worklogs::Entity>(
                session,
                &Criteria::new()
                    .filter(activity_tasks::Column::UserId.eq(user_id))
                    .order_by(activity_tasks::Column::CreatedAt, Order::Desc)
                    .order_by(activity_tasks::Column::Title, Order::Asc)
                    .unbounded(),
            )
            .await?;
        if tasks.is_empty() {
            return Ok(Journal {
                project_assignments: Vec::new(),
                tasks: Vec::new(),
            });
        }

        let mut activity_ids = Vec::new();
        for (task, _) in &tasks {
            if !activity_ids.contains(&task.activity_id) {
                activity_ids.push(task.activity_id);
            }
        }
        let mut by_id: HashMap<Uuid, ActivityWithType> = ACTIVITIES
            .get_all_with_parent::<activity_types::Entity>(
                session,
                &Criteria::new()
                    .filter(activities::Column::Id.is_in(activity_ids.iter().copied()))
                    .unbounded(),
            )
            .await?
            .into_iter()
            .filter_map(|(activity, kind)| {
                kind.map(|k| (activity.id, activity_with_type(activity, k)))
            })
            .collect();
        let project_assignments = activity_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();

        let tasks: Vec<JournalTask> = tasks
            .into_iter()
            .map(|(task, logs)| {
                let mut worklogs: Vec<JournalWorklog> = logs
                    .into_iter()
                    .filter(|w| w.user_id == user_id && w.date >= start && w.date <= end)
                    .map(JournalWorklog::from)
                    .collect();
                worklogs.sort_by_key(|w| w.date);
                JournalTask {
                    id: task.id,
                    title: task.title,
                    activity_id: task.activity_id,
                    worklogs,
                }
            })
            .collect();
        debug!(tasks = tasks.len(), "journal assembled");
        Ok(Journal {
            project_assignments,
            tasks,
        })
    }

    /// Apply worklog cells for one user as a single unit.
    ///
    /// Entries with an id and no (or zero) duration are deleted, the rest are
    /// upserted by id. Afterwards the per-date totals of every touched date are
    /// checked against the daily limit; any excess rolls the whole batch back.
    #[instrument(
        name = "timesheet.activities.batch_worklog",
        skip(self, session, entries),
        fields(entries = entries.len())
    )]
    pub async fn batch_worklog(
        &self,
        session: &DbSession,
        user_id: Uuid,
        entries: Vec<WorklogEntry>,
    ) -> Result<Vec<Worklog>, DomainError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut dates = BTreeSet::new();
        let mut claimed = Vec::new();
        let mut to_delete = Vec::new();
        let mut to_upsert = Vec::new();
        for entry in entries {
            dates.insert(entry.date);
            match (entry.id, entry.duration) {
                (None, None) => {
                    return Err(DomainError::invalid_worklog(format!(
                        "entry for {} has neither 'id' nor 'duration'",
                        entry.date
                    )));
                }
                (Some(id), None) => to_delete.push(id),
                (Some(id), Some(hours)) if hours == 0.0 => to_delete.push(id),
                (id, Some(hours)) => {
                    if !(WORKLOG_MIN_HOURS..=WORKLOG_MAX_HOURS).contains(&hours) {
                        return Err(DomainError::invalid_worklog(format!(
                            "duration {hours} on {} is outside {WORKLOG_MIN_HOURS}..={WORKLOG_MAX_HOURS} hours",
                            entry.date
                        )));
                    }
                    claimed.extend(id);
                    to_upsert.push(Payload::from(worklogs::ActiveModel {
                        id: Set(id.unwrap_or_else(Uuid::new_v4)),
                        date: Set(entry.date),
                        duration: Set(hours),
                        activity_task_id: Set(entry.task_id),
                        user_id: Set(user_id),
                        ..Default::default()
                    }));
                }
            }
        }
        claimed.extend(to_delete.iter().copied());
        debug!(
            upserts = to_upsert.len(),
            deletes = to_delete.len(),
            dates = dates.len(),
            "worklog batch classified"
        );

        let result: Result<Vec<worklogs::Model>, DomainError> = async {
            self.ensure_owned(session, user_id, &claimed).await?;

            let saved = WORKLOGS
                .upsert_many(session, to_upsert, &UpsertOptions::default(), false)
                .await?;
            if !to_delete.is_empty() {
                WORKLOGS
                    .delete_many(
                        session,
                        &[
                            worklogs::Column::Id.is_in(to_delete),
                            worklogs::Column::UserId.eq(user_id),
                        ],
                        false,
                    )
                    .await?;
            }

            let over = self.days_over_limit(session, user_id, &dates).await?;
            if !over.is_empty() {
                warn!(days = over.len(), "daily limit exceeded, discarding batch");
                return Err(DomainError::DailyLimitExceeded { totals: over });
            }
            Ok(saved)
        }
        .await;

        let saved = finish_unit(session, result).await?;
        info!(saved = saved.len(), "worklogs recorded");
        Ok(saved.into_iter().map(Worklog::from).collect())
    }

    /// Existing worklogs referenced by id must belong to `user_id`.
    async fn ensure_owned(
        &self,
        session: &DbSession,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> Result<(), DomainError> {
        if ids.is_empty() {
            return Ok(());
        }
        let unique: HashSet<Uuid> = ids.iter().copied().collect();
        let criteria = Criteria::new()
            .filter(worklogs::Column::Id.is_in(unique))
            .filter(worklogs::Column::UserId.ne(user_id))
            .limit(1);
        match WORKLOGS.get_all(session, &criteria).await?.into_iter().next() {
            Some(foreign) => Err(DomainError::WorklogNotOwned { id: foreign.id }),
            None => Ok(()),
        }
    }

    /// Dates among `dates` whose summed duration for the user is over the limit.
    async fn days_over_limit(
        &self,
        session: &DbSession,
        user_id: Uuid,
        dates: &BTreeSet<NaiveDate>,
    ) -> Result<Vec<(NaiveDate, f64)>, DomainError> {
        let sum = || Expr::col(worklogs::Column::Duration).sum();
        let tx = session.tx().await?;
        let rows = worklogs::Entity::find()
            .select_only()
            .column(worklogs::Column::Date)
            .column_as(sum(), "total")
            .filter(worklogs::Column::UserId.eq(user_id))
            .filter(worklogs::Column::Date.is_in(dates.iter().copied()))
            .group_by(worklogs::Column::Date)
            .having(Expr::expr(sum()).gt(self.config.daily_hours_limit))
            .order_by_asc(worklogs::Column::Date)
            .into_model::<DayTotal>()
            .all(&*tx)
            .await?;
        Ok(rows.into_iter().map(|r| (r.date, r.total)).collect())
    }
}
