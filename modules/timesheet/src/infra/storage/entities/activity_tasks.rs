use sea_orm::entity::prelude::*;
use worktrack_db::{FieldKind, FieldMap, Resource};

/// A user's own task inside an activity; titles are unique per activity.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "activity_tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub activity_id: Uuid,
    pub user_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::activities::Entity",
        from = "Column::ActivityId",
        to = "super::activities::Column::Id",
        on_delete = "Cascade"
    )]
    Activity,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    User,
    #[sea_orm(has_many = "super::worklogs::Entity")]
    Worklogs,
}

impl Related<super::activities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activity.def()
    }
}

impl Related<super::worklogs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Worklogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Resource for Entity {
    const NAME: &'static str = "activity task";

    fn fields() -> FieldMap<Self> {
        FieldMap::new()
            .insert("id", Column::Id, FieldKind::Uuid)
            .insert("title", Column::Title, FieldKind::String)
            .insert("activity_id", Column::ActivityId, FieldKind::Uuid)
            .insert("user_id", Column::UserId, FieldKind::Uuid)
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
