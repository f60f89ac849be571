use sea_orm::entity::prelude::*;
use sea_orm::Set;
use worktrack_db::{FieldKind, FieldMap, Resource};

pub const DEFAULT_ROLE: &str = "user";
pub const ADMIN_ROLE: &str = "admin";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub full_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub role: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sessions::Entity")]
    Sessions,
    #[sea_orm(has_many = "super::todos::Entity")]
    Todos,
}

impl Related<super::sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl Related<super::todos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Todos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Resource for Entity {
    const NAME: &'static str = "user";

    fn fields() -> FieldMap<Self> {
        FieldMap::new()
            .insert("id", Column::Id, FieldKind::Uuid)
            .insert("full_name", Column::FullName, FieldKind::String)
            .insert("email", Column::Email, FieldKind::String)
            .insert("hashed_password", Column::HashedPassword, FieldKind::String)
            .insert("is_active", Column::IsActive, FieldKind::Bool)
            .insert("is_admin", Column::IsAdmin, FieldKind::Bool)
            .insert("role", Column::Role, FieldKind::String)
            .insert("created_at", Column::CreatedAt, FieldKind::DateTimeUtc)
            .insert("updated_at", Column::UpdatedAt, FieldKind::DateTimeUtc)
    }

    fn primary_key() -> Column {
        Column::Id
    }

    fn on_insert(am: &mut ActiveModel) {
        super::stamp_insert(am, Column::Id, Column::CreatedAt, Column::UpdatedAt);
        if am.is_active.is_not_set() {
            am.is_active = Set(true);
        }
        if am.is_admin.is_not_set() {
            am.is_admin = Set(false);
        }
        if am.role.is_not_set() {
            am.role = Set(DEFAULT_ROLE.to_string());
        }
    }

    fn updated_at() -> Option<Column> {
        Some(Column::UpdatedAt)
    }
}
