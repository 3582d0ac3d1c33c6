use crate::domain::{Task, TaskIdentifier};
use crate::library::helpers::{connect_with_retry, RetryPolicy};
use crate::library::BoxedError;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id SERIAL PRIMARY KEY,
    task TEXT NOT NULL,
    done BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Errors returned by a [`TaskStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    /// No task with the given identifier exists
    #[error("task {0} does not exist")]
    NotFound(TaskIdentifier),
    /// Database rejected the query or is unreachable
    #[error("database operation failed")]
    Database(#[from] sqlx::Error),
}

/// Durable storage of the task list
#[async_trait]
pub trait TaskStore {
    /// All tasks ordered by their identifier
    async fn list(&self) -> Result<Vec<Task>, StoreError>;

    /// Persists a new, not yet completed task
    async fn create(&self, description: &str) -> Result<Task, StoreError>;

    /// Marks an existing task as done and returns its new state
    async fn mark_done(&self, id: TaskIdentifier) -> Result<Task, StoreError>;

    /// Verifies that the store is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}

/// [`TaskStore`] backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    /// Connects to the database and makes sure the schema exists
    ///
    /// Each attempt opens the pool and probes it with a query. Once the policy is
    /// exhausted a [`ConnectionError`](crate::library::helpers::ConnectionError) is returned.
    #[instrument(skip(options))]
    pub async fn connect(
        options: PgConnectOptions,
        policy: RetryPolicy,
    ) -> Result<Self, BoxedError> {
        let pool = connect_with_retry("postgres", policy, || async {
            let pool = PgPoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .acquire_timeout(ACQUIRE_TIMEOUT)
                .connect_with(options.clone())
                .await?;

            sqlx::query("SELECT 1").execute(&pool).await?;

            Ok::<_, sqlx::Error>(pool)
        })
        .await?;

        let store = Self { pool };
        store.ensure_schema().await?;

        info!("Connected to database");

        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let tasks = sqlx::query_as::<_, Task>("SELECT id, task, done FROM todos ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }

    async fn create(&self, description: &str) -> Result<Task, StoreError> {
        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO todos (task) VALUES ($1) RETURNING id, task, done",
        )
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn mark_done(&self, id: TaskIdentifier) -> Result<Task, StoreError> {
        sqlx::query_as::<_, Task>(
            "UPDATE todos SET done = TRUE, updated_at = CURRENT_TIMESTAMP WHERE id = $1 RETURNING id, task, done",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
