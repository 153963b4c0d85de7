use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::models::Todo;

const TODO_COLUMNS: &str = "id, title, description, completed, completed_on, created_at";

/// Persistence operations the handlers rely on.
///
/// Every write is a single statement, so concurrent writers to the same
/// todo resolve as last-write-wins.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn find_by_completed(&self, completed: bool) -> Result<Vec<Todo>, sqlx::Error>;
    async fn find_all(&self) -> Result<Vec<Todo>, sqlx::Error>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, sqlx::Error>;
    async fn insert(
        &self,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<Todo, sqlx::Error>;
    /// Overwrites both text fields and returns the post-update document.
    async fn update_by_id(
        &self,
        id: &str,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<Option<Todo>, sqlx::Error>;
    async fn complete_by_id(
        &self,
        id: &str,
        completed_on: DateTime<Utc>,
    ) -> Result<Option<Todo>, sqlx::Error>;
    async fn delete_by_id(&self, id: &str) -> Result<Option<Todo>, sqlx::Error>;
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub struct SqliteTodoStore {
    db: SqlitePool,
    schema: Arc<OnceCell<()>>,
}

impl SqliteTodoStore {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            schema: Arc::new(OnceCell::new()),
        }
    }

    /// Creates the `todos` table on first use.
    ///
    /// A failure is not cached, so a database that was unreachable at
    /// startup gets its table as soon as it comes back.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        self.schema
            .get_or_try_init(|| async {
                super::migrate(&self.db)
                    .await
                    .map_err(|e| sqlx::Error::Migrate(Box::new(e)))
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TodoStore for SqliteTodoStore {
    async fn find_by_completed(&self, completed: bool) -> Result<Vec<Todo>, sqlx::Error> {
        self.ensure_schema().await?;
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE completed = ? ORDER BY rowid"
        ))
        .bind(completed)
        .fetch_all(&self.db)
        .await
    }

    async fn find_all(&self) -> Result<Vec<Todo>, sqlx::Error> {
        self.ensure_schema().await?;
        sqlx::query_as::<_, Todo>(&format!("SELECT {TODO_COLUMNS} FROM todos ORDER BY rowid"))
            .fetch_all(&self.db)
            .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, sqlx::Error> {
        self.ensure_schema().await?;
        sqlx::query_as::<_, Todo>(&format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    async fn insert(
        &self,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<Todo, sqlx::Error> {
        self.ensure_schema().await?;
        let todo = Todo {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            completed: false,
            completed_on: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO todos
                (id, title, description, completed, completed_on, created_at)
            VALUES (?1, ?2, ?3, 0, NULL, ?4)
            "#,
        )
        .bind(&todo.id)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.created_at)
        .execute(&self.db)
        .await?;

        Ok(todo)
    }

    async fn update_by_id(
        &self,
        id: &str,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<Option<Todo>, sqlx::Error> {
        self.ensure_schema().await?;
        sqlx::query_as::<_, Todo>(&format!(
            r#"
            UPDATE todos
            SET title = ?1,
                description = ?2
            WHERE id = ?3
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(title)
        .bind(description)
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    async fn complete_by_id(
        &self,
        id: &str,
        completed_on: DateTime<Utc>,
    ) -> Result<Option<Todo>, sqlx::Error> {
        self.ensure_schema().await?;
        sqlx::query_as::<_, Todo>(&format!(
            r#"
            UPDATE todos
            SET completed = 1,
                completed_on = ?1
            WHERE id = ?2
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(completed_on)
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    async fn delete_by_id(&self, id: &str) -> Result<Option<Todo>, sqlx::Error> {
        self.ensure_schema().await?;
        sqlx::query_as::<_, Todo>(&format!(
            "DELETE FROM todos WHERE id = ? RETURNING {TODO_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("select 1").execute(&self.db).await?;
        Ok(())
    }
}
