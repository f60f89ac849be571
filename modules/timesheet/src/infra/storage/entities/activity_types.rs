use sea_orm::entity::prelude::*;
use worktrack_db::{FieldKind, FieldMap, Resource};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "activity_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub title: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::activities::Entity")]
    Activities,
}

impl Related<super::activities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Resource for Entity {
    const NAME: &'static str = "activity type";

    fn fields() -> FieldMap<Self> {
        FieldMap::new()
            .insert("id", Column::Id, FieldKind::Uuid)
            .insert("title", Column::Title, FieldKind::String)
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
