use sea_orm::entity::prelude::*;
use worktrack_db::{FieldKind, FieldMap, Resource};

/// Login session; tokens are stored only as SHA-256 hex digests.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub refresh_token_hash: String,
    #[sea_orm(indexed)]
    pub access_token_hash: String,
    pub is_active: bool,
    pub expires_at: DateTimeUtc,
    pub last_used_at: DateTimeUtc,
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub ip_address: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub user_agent: Option<String>,
    pub user_id: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Resource for Entity {
    const NAME: &'static str = "session";

    fn fields() -> FieldMap<Self> {
        FieldMap::new()
            .insert("id", Column::Id, FieldKind::Uuid)
            .insert("is_active", Column::IsActive, FieldKind::Bool)
            .insert("expires_at", Column::ExpiresAt, FieldKind::DateTimeUtc)
            .insert("last_used_at", Column::LastUsedAt, FieldKind::DateTimeUtc)
            .insert("device_name", Column::DeviceName, FieldKind::String)
            .insert("device_type", Column::DeviceType, FieldKind::String)
            .insert("ip_address", Column::IpAddress, FieldKind::String)
            .insert("user_agent", Column::UserAgent, FieldKind::String)
            .insert("user_id", Column::UserId, FieldKind::Uuid)
            .insert("created_at", Column::CreatedAt, FieldKind::DateTimeUtc)
    }

    fn primary_key() -> Column {
        Column::Id
    }

    fn on_insert(am: &mut ActiveModel) {
        super::stamp_insert(am, Column::Id, Column::CreatedAt, Column::UpdatedAt);
        if am.is_active.is_not_set() {
            am.is_active = sea_orm::Set(true);
        }
        if am.last_used_at.is_not_set() {
            am.last_used_at = sea_orm::Set(chrono::Utc::now());
        }
    }

    fn updated_at() -> Option<Column> {
        Some(Column::UpdatedAt)
    }
}
