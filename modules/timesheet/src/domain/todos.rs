use sea_orm::{ColumnTrait, Order, Set};
use tracing::{info, instrument};
use uuid::Uuid;
use worktrack_db::{Criteria, DbSession, Lookup, Payload, Repository};

use crate::config::TimesheetConfig;
use crate::contract::model::{NewTodo, Todo};
use crate::domain::error::DomainError;
use crate::domain::finish_unit;
use crate::infra::storage::entities::{subtasks, todos};
use crate::infra::storage::mapper::todo_with_subtasks;

const TODOS: Repository<todos::Entity> = Repository::new();
const SUBTASKS: Repository<subtasks::Entity> = Repository::new();

/// Personal todo lists; every operation is scoped to the owning user.
pub struct TodoService {
    config: TimesheetConfig,
}

impl TodoService {
    pub fn new(config: TimesheetConfig) -> Self {
        Self { config }
    }

    #[instrument(name = "timesheet.todos.list", skip(self, session))]
    pub async fn todos(&self, session: &DbSession, user_id: Uuid) -> Result<Vec<Todo>, DomainError> {
        let criteria = Criteria::new()
            .filter(todos::Column::UserId.eq(user_id))
            .order_by(todos::Column::CreatedAt, Order::Asc)
            .limit(self.config.page_size);
        let rows = TODOS.get_all_with::<subtasks::Entity>(session, &criteria).await?;
        Ok(rows
            .into_iter()
            .map(|(todo, subtasks)| todo_with_subtasks(todo, subtasks))
            .collect())
    }

    #[instrument(name = "timesheet.todos.get", skip(self, session))]
    pub async fn todo(&self, session: &DbSession, user_id: Uuid, id: Uuid) -> Result<Todo, DomainError> {
        let lookup = Lookup::id(id).and(todos::Column::UserId.eq(user_id));
        let (todo, subtasks) = TODOS
            .get_one_with::<subtasks::Entity>(session, &lookup)
            .await?;
        Ok(todo_with_subtasks(todo, subtasks))
    }

    /// The todo and all of its subtasks are written in one transaction.
    #[instrument(name = "timesheet.todos.create", skip(self, session, new_todo), fields(subtasks = new_todo.subtasks.len()))]
    pub async fn create_todo(
        &self,
        session: &DbSession,
        user_id: Uuid,
        new_todo: NewTodo,
    ) -> Result<Todo, DomainError> {
        let result: Result<Todo, DomainError> = async {
            let todo_am = todos::ActiveModel {
                title: Set(new_todo.title),
                user_id: Set(user_id),
                ..Default::default()
            };
            let todo = TODOS.create(session, todo_am.into(), false).await?;

            let payloads: Vec<Payload<subtasks::ActiveModel>> = new_todo
                .subtasks
                .into_iter()
                .map(|s| {
                    Payload::from(subtasks::ActiveModel {
                        title: Set(s.title),
                        priority: Set(s.priority),
                        todo_id: Set(todo.id),
                        ..Default::default()
                    })
                })
                .collect();
            let subtasks = SUBTASKS
                .create_many(session, payloads, self.config.batch_size, false)
                .await?;
            Ok(todo_with_subtasks(todo, subtasks))
        }
        .await;

        let todo = finish_unit(session, result).await?;
        info!(todo_id = %todo.id, "todo created");
        Ok(todo)
    }

    /// Subtasks go with it through the cascading foreign key.
    #[instrument(name = "timesheet.todos.delete", skip(self, session))]
    pub async fn delete_todo(&self, session: &DbSession, user_id: Uuid, id: Uuid) -> Result<(), DomainError> {
        let lookup = Lookup::id(id).and(todos::Column::UserId.eq(user_id));
        TODOS.delete_one(session, &lookup, true).await?;
        info!(todo_id = %id, "todo deleted");
        Ok(())
    }
}
