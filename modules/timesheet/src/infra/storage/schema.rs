//! Table and index creation from the entity definitions. Every statement is
//! `IF NOT EXISTS`, so running it against an existing database is a no-op.

use sea_orm::sea_query::{Expr, Index, IndexCreateStatement, TableCreateStatement};
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};
use tracing::{debug, info};

use super::entities::{
    activities, activity_tasks, activity_types, activity_users, sessions, subtasks, todos, users,
    worklogs,
};

/// Shortest and longest duration a single worklog may hold, in hours.
pub const WORKLOG_MIN_HOURS: f64 = 1.0;
pub const WORKLOG_MAX_HOURS: f64 = 8.0;

pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    // referenced tables first
    create_table(db, &schema, users::Entity, None).await?;
    create_table(db, &schema, sessions::Entity, None).await?;
    create_table(db, &schema, activity_types::Entity, None).await?;
    create_table(db, &schema, activities::Entity, None).await?;
    create_table(db, &schema, activity_users::Entity, None).await?;
    create_table(db, &schema, activity_tasks::Entity, None).await?;
    create_table(
        db,
        &schema,
        worklogs::Entity,
        Some(
            Expr::col(worklogs::Column::Duration)
                .gte(WORKLOG_MIN_HOURS)
                .and(Expr::col(worklogs::Column::Duration).lte(WORKLOG_MAX_HOURS)),
        ),
    )
    .await?;
    create_table(db, &schema, todos::Entity, None).await?;
    create_table(db, &schema, subtasks::Entity, None).await?;

    for index in composite_unique_indexes() {
        db.execute(db.get_database_backend().build(&index)).await?;
    }

    info!("schema ready");
    Ok(())
}

async fn create_table<C, E>(
    db: &C,
    schema: &Schema,
    entity: E,
    check: Option<sea_orm::sea_query::SimpleExpr>,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut table: TableCreateStatement = schema.create_table_from_entity(entity);
    table.if_not_exists();
    if let Some(expr) = check {
        table.check(expr);
    }
    db.execute(backend.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }
    debug!(table = entity.table_name(), "table ensured");
    Ok(())
}

fn composite_unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("uq_user_activity")
            .table(activity_users::Entity)
            .col(activity_users::Column::UserId)
            .col(activity_users::Column::ActivityId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_title_activity_id")
            .table(activity_tasks::Entity)
            .col(activity_tasks::Column::Title)
            .col(activity_tasks::Column::ActivityId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_user_activity_task_date")
            .table(worklogs::Entity)
            .col(worklogs::Column::ActivityTaskId)
            .col(worklogs::Column::UserId)
            .col(worklogs::Column::Date)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}
