#![allow(dead_code)]

use anyhow::Result;
use chrono::Utc;
use sea_orm::{ConnectionTrait, EntityTrait, Schema, Set};
use uuid::Uuid;
use worktrack_db::{ConnectOpts, DbHandle, FieldKind, FieldMap, Resource};

pub mod project {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "projects")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub title: String,
        #[sea_orm(unique)]
        pub code: String,
        pub hours: i32,
        pub rate: f64,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::item::Entity")]
        Item,
    }

    impl Related<super::item::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Item.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod item {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "items")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub name: String,
        pub project_id: Uuid,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::project::Entity",
            from = "Column::ProjectId",
            to = "super::project::Column::Id",
            on_delete = "Cascade"
        )]
        Project,
    }

    impl Related<super::project::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Project.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

impl Resource for project::Entity {
    const NAME: &'static str = "project";

    fn fields() -> FieldMap<Self> {
        FieldMap::new()
            .insert("id", project::Column::Id, FieldKind::Uuid)
            .insert("title", project::Column::Title, FieldKind::String)
            .insert("code", project::Column::Code, FieldKind::String)
            .insert("hours", project::Column::Hours, FieldKind::I32)
            .insert("rate", project::Column::Rate, FieldKind::F64)
            .insert("created_at", project::Column::CreatedAt, FieldKind::DateTimeUtc)
            .insert("updated_at", project::Column::UpdatedAt, FieldKind::DateTimeUtc)
    }

    fn primary_key() -> project::Column {
        project::Column::Id
    }

    fn on_insert(am: &mut project::ActiveModel) {
        let now = Utc::now();
        if am.id.is_not_set() {
            am.id = Set(Uuid::new_v4());
        }
        if am.created_at.is_not_set() {
            am.created_at = Set(now);
        }
        am.updated_at = Set(now);
    }

    fn updated_at() -> Option<project::Column> {
        Some(project::Column::UpdatedAt)
    }
}

impl Resource for item::Entity {
    const NAME: &'static str = "item";

    fn fields() -> FieldMap<Self> {
        FieldMap::new()
            .insert("id", item::Column::Id, FieldKind::Uuid)
            .insert("name", item::Column::Name, FieldKind::String)
            .insert("project_id", item::Column::ProjectId, FieldKind::Uuid)
    }

    fn primary_key() -> item::Column {
        item::Column::Id
    }

    fn on_insert(am: &mut item::ActiveModel) {
        let now = Utc::now();
        if am.id.is_not_set() {
            am.id = Set(Uuid::new_v4());
        }
        am.created_at = Set(now);
        am.updated_at = Set(now);
    }

    fn updated_at() -> Option<item::Column> {
        Some(item::Column::UpdatedAt)
    }
}

/// Fresh in-memory database with both tables.
pub async fn setup() -> Result<DbHandle> {
    let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
    let conn = db.sea();
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);
    conn.execute(backend.build(&schema.create_table_from_entity(project::Entity)))
        .await?;
    conn.execute(backend.build(&schema.create_table_from_entity(item::Entity)))
        .await?;
    Ok(db)
}

pub fn new_project(title: &str, code: &str, hours: i32) -> project::ActiveModel {
    project::ActiveModel {
        title: Set(title.to_string()),
        code: Set(code.to_string()),
        hours: Set(hours),
        rate: Set(f64::from(hours) * 1.5),
        ..Default::default()
    }
}

pub async fn count_projects(db: &DbHandle) -> Result<usize> {
    Ok(project::Entity::find().all(&*db.sea()).await?.len())
}
