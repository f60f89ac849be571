use sea_orm::entity::prelude::*;
use worktrack_db::{FieldKind, FieldMap, Resource};

/// Assignment of a user to an activity; unique per (user_id, activity_id).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "activity_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Uuid,
    pub assigned_by_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade",
        fk_name = "fk_activity_users_user"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::activities::Entity",
        from = "Column::ActivityId",
        to = "super::activities::Column::Id",
        on_delete = "Cascade",
        fk_name = "fk_activity_users_activity"
    )]
    Activity,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AssignedById",
        to = "super::users::Column::Id",
        on_delete = "SetNull",
        fk_name = "fk_activity_users_assigned_by"
    )]
    AssignedBy,
}

impl Related<super::activities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activity.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Resource for Entity {
    const NAME: &'static str = "activity assignment";

    fn fields() -> FieldMap<Self> {
        FieldMap::new()
            .insert("id", Column::Id, FieldKind::Uuid)
            .insert("user_id", Column::UserId, FieldKind::Uuid)
            .insert("activity_id", Column::ActivityId, FieldKind::Uuid)
            .insert("assigned_by_id", Column::AssignedById, FieldKind::Uuid)
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
