use super::article::{ArticleError, ArticleSource};
use super::publisher::TaskEventPublisher;
use super::store::{StoreError, TaskStore};
use crate::domain::event::{TaskCreatedNotification, TaskUpdatedNotification};
use crate::domain::{Task, TaskIdentifier};
use crate::library::communication::event::NotificationPublisher;
use crate::library::http::{error_response, json_response, recover_rejection};
use crate::library::scheduling::{Job, JobManager};
use crate::library::EmptyResult;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use warp::cors::Builder as CorsBuilder;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

const BODY_SIZE_LIMIT: u64 = 16 * 1024;

/// Everything request handlers need to serve the task list
pub struct TodoContext<S, P, A> {
    store: S,
    publisher: TaskEventPublisher<P>,
    articles: A,
}

impl<S, P, A> TodoContext<S, P, A> {
    /// Creates a new context from raw parts
    pub fn new(store: S, publisher: TaskEventPublisher<P>, articles: A) -> Self {
        Self {
            store,
            publisher,
            articles,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateTaskRequest {
    #[serde(alias = "description")]
    task: String,
}

fn store_error_response(error: StoreError) -> Response {
    let status = match &error {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Database(cause) => {
            error!(%cause, "Database operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    error_response(error, status)
}

async fn welcome() -> Result<Response, Infallible> {
    Ok(json_response(
        &json!({
            "message": "Welcome to the Todo API! Use /api/todos to manage your tasks.",
            "status_code": 200,
            "Endpoints": [
                "GET /api/todos - Retrieve all todos",
                "POST /api/todos - Create a new todo",
                "PUT /api/todos/:id - Mark a todo as done",
                "POST /api/todos/random - Create a random todo",
                "GET /api/todos/db-health - Check database connectivity",
                "GET /api/todos/healthz - Health check endpoint",
            ],
        }),
        StatusCode::OK,
    ))
}

async fn list_tasks<S, P, A>(context: Arc<TodoContext<S, P, A>>) -> Result<Response, Infallible>
where
    S: TaskStore + Send + Sync,
{
    match context.store.list().await {
        Ok(tasks) => {
            info!(count = tasks.len(), "Tasks retrieved");
            Ok(json_response(&tasks, StatusCode::OK))
        }
        Err(error) => Ok(store_error_response(error)),
    }
}

/// Validates and persists a new task, announcing it once the store acknowledged it
async fn persist_task<S, P, A>(
    context: &TodoContext<S, P, A>,
    description: &str,
) -> Result<Task, Response>
where
    S: TaskStore + Send + Sync,
    P: NotificationPublisher + Send + Sync,
{
    let length = description.chars().count();

    if let Err(error) = Task::validate_description(description) {
        warn!(length, %error, "Task rejected");
        return Err(error_response(error, StatusCode::BAD_REQUEST));
    }

    info!(length, task = description, "Task received");

    let task = context
        .store
        .create(description)
        .await
        .map_err(store_error_response)?;

    context
        .publisher
        .announce::<TaskCreatedNotification>(&task)
        .await;

    Ok(task)
}

async fn create_task<S, P, A>(
    request: CreateTaskRequest,
    context: Arc<TodoContext<S, P, A>>,
) -> Result<Response, Infallible>
where
    S: TaskStore + Send + Sync,
    P: NotificationPublisher + Send + Sync,
{
    Ok(match persist_task(&context, &request.task).await {
        Ok(task) => json_response(&task, StatusCode::CREATED),
        Err(response) => response,
    })
}

async fn create_random_task<S, P, A>(
    context: Arc<TodoContext<S, P, A>>,
) -> Result<Response, Infallible>
where
    S: TaskStore + Send + Sync,
    P: NotificationPublisher + Send + Sync,
    A: ArticleSource + Send + Sync,
{
    let article = match context.articles.random_article().await {
        Ok(article) => article,
        Err(error @ ArticleError::SameArticle) => {
            return Ok(error_response(error, StatusCode::BAD_REQUEST))
        }
        Err(error) => {
            error!(%error, "Unable to pick a random article");
            return Ok(error_response(error, StatusCode::INTERNAL_SERVER_ERROR));
        }
    };

    let description = format!("Read: {}", article);

    Ok(match persist_task(&context, &description).await {
        Ok(task) => json_response(&json!({ "New todo created": task }), StatusCode::CREATED),
        Err(response) => response,
    })
}

async fn mark_task_done<S, P, A>(
    id: String,
    context: Arc<TodoContext<S, P, A>>,
) -> Result<Response, Infallible>
where
    S: TaskStore + Send + Sync,
    P: NotificationPublisher + Send + Sync,
{
    let id = match id.parse::<i32>() {
        Ok(id) => TaskIdentifier::new(id),
        Err(_) => {
            warn!(%id, "Invalid id parameter");
            return Ok(error_response("Invalid id parameter", StatusCode::BAD_REQUEST));
        }
    };

    let task = match context.store.mark_done(id).await {
        Ok(task) => task,
        Err(error) => return Ok(store_error_response(error)),
    };

    info!(%id, "Task marked as done");

    context
        .publisher
        .announce::<TaskUpdatedNotification>(&task)
        .await;

    Ok(json_response(&json!({ "Todo updated": task }), StatusCode::OK))
}

async fn database_health<S, P, A>(
    context: Arc<TodoContext<S, P, A>>,
) -> Result<Response, Infallible>
where
    S: TaskStore + Send + Sync,
{
    Ok(match context.store.ping().await {
        Ok(_) => json_response(
            &json!({ "message": "Database is reachable" }),
            StatusCode::OK,
        ),
        Err(error) => {
            error!(%error, "Database health check failed");
            error_response("Database is not reachable", StatusCode::INTERNAL_SERVER_ERROR)
        }
    })
}

async fn service_health() -> Result<Response, Infallible> {
    Ok(json_response(
        &json!({ "message": "Service is healthy" }),
        StatusCode::OK,
    ))
}

/// HTTP routes of the todo service
pub fn routes<S, P, A>(
    context: Arc<TodoContext<S, P, A>>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone
where
    S: TaskStore + Send + Sync + 'static,
    P: NotificationPublisher + Send + Sync + 'static,
    A: ArticleSource + Send + Sync + 'static,
{
    let with_context = warp::any().map(move || context.clone());

    let welcome_route = warp::path::end().and(warp::get()).and_then(welcome);

    let list_route = warp::path!("api" / "todos")
        .and(warp::get())
        .and(with_context.clone())
        .and_then(list_tasks);

    let create_route = warp::path!("api" / "todos")
        .and(warp::post())
        .and(warp::body::content_length_limit(BODY_SIZE_LIMIT))
        .and(warp::body::json())
        .and(with_context.clone())
        .and_then(create_task);

    let random_route = warp::path!("api" / "todos" / "random")
        .and(warp::post())
        .and(with_context.clone())
        .and_then(create_random_task);

    let database_health_route = warp::path!("api" / "todos" / "db-health")
        .and(warp::get())
        .and(with_context.clone())
        .and_then(database_health);

    let health_route = warp::path!("api" / "todos" / "healthz")
        .and(warp::get())
        .and_then(service_health);

    let mark_done_route = warp::path!("api" / "todos" / String)
        .and(warp::put())
        .and(with_context)
        .and_then(mark_task_done);

    welcome_route
        .or(list_route)
        .or(create_route)
        .or(random_route)
        .or(database_health_route)
        .or(health_route)
        .or(mark_done_route)
        .recover(recover_rejection)
}

/// Job serving the todo [`routes`]
pub struct ServerJob<S, P, A> {
    port: u16,
    cors: CorsBuilder,
    context: Arc<TodoContext<S, P, A>>,
}

impl<S, P, A> ServerJob<S, P, A> {
    /// Creates a new job listening on all interfaces
    pub fn new(port: u16, cors: CorsBuilder, context: TodoContext<S, P, A>) -> Self {
        Self {
            port,
            cors,
            context: Arc::new(context),
        }
    }
}

#[async_trait]
impl<S, P, A> Job for ServerJob<S, P, A>
where
    S: TaskStore + Send + Sync + 'static,
    P: NotificationPublisher + Send + Sync + 'static,
    A: ArticleSource + Send + Sync + 'static,
{
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let routes = routes(self.context.clone())
            .with(self.cors.clone())
            .with(warp::trace::request());

        let source_addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let (addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(source_addr, manager.termination_signal())?;

        info!(?addr, "Serving todo API");
        manager.ready().await;
        server.await;

        Ok(())
    }
}
