use sea_orm::entity::prelude::*;
use worktrack_db::{FieldKind, FieldMap, Resource};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub code: String,
    pub expected_hours_monthly: i32,
    pub activity_type_id: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::activity_types::Entity",
        from = "Column::ActivityTypeId",
        to = "super::activity_types::Column::Id",
        on_delete = "Restrict"
    )]
    ActivityType,
    #[sea_orm(has_many = "super::activity_tasks::Entity")]
    Tasks,
    #[sea_orm(has_many = "super::activity_users::Entity")]
    Assignments,
}

impl Related<super::activity_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivityType.def()
    }
}

impl Related<super::activity_tasks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl Related<super::activity_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Resource for Entity {
    const NAME: &'static str = "activity";

    fn fields() -> FieldMap<Self> {
        FieldMap::new()
            .insert("id", Column::Id, FieldKind::Uuid)
            .insert("title", Column::Title, FieldKind::String)
            .insert("code", Column::Code, FieldKind::String)
            .insert(
                "expected_hours_monthly",
                Column::ExpectedHoursMonthly,
                FieldKind::I32,
            )
            .insert("activity_type_id", Column::ActivityTypeId, FieldKind::Uuid)
            .insert("created_at", Column::CreatedAt, FieldKind::DateTimeUtc)
            .insert("updated_at", Column::UpdatedAt, FieldKind::DateTimeUtc)
    }

    fn primary_key() -> Column {
        Column::Id
    }

    fn on_insert(am: &mut ActiveModel) {
        super::stamp_insert(am, Column::Id, Column::CreatedAt, Column::UpdatedAt);
    }

    fn updated_at() -> Option<Column> {
        Some(Column::UpdatedAt)
    }
}
