//! In-memory stand-in for the hosted record store's REST surface.
//!
//! Serves the `tasks` table under `/rest/v1/tasks` with the subset of the
//! PostgREST dialect the client uses: `order=<column>.<asc|desc>` on reads,
//! `id=eq.<uuid>` filters on PATCH/DELETE, and mutations that echo the
//! affected rows as a JSON array.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present_field")]
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Error body in the shape the hosted store uses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn reject(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            code: code.to_string(),
            message: message.into(),
        }),
    )
}

#[derive(Default)]
pub struct Table {
    rows: HashMap<Uuid, Task>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Table {
    /// Wall-clock time, nudged forward so no two stamps are equal.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

pub type Db = Arc<RwLock<Table>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Table::default()));
    Router::new()
        .route(
            "/rest/v1/tasks",
            get(select_tasks)
                .post(insert_task)
                .patch(update_task)
                .delete(delete_task),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn check_title(title: &str) -> ApiResult<()> {
    if title.trim().is_empty() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "23514",
            "new row violates check constraint \"tasks_title_check\"",
        ));
    }
    Ok(())
}

/// Parse `column.direction` from the `order` parameter.
fn parse_order(value: &str) -> ApiResult<(String, bool)> {
    let (column, direction) = value.split_once('.').unwrap_or((value, "asc"));
    if !matches!(column, "created_at" | "updated_at" | "title") {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "42703",
            format!("column tasks.{column} does not exist"),
        ));
    }
    let descending = match direction {
        "asc" => false,
        "desc" => true,
        other => {
            return Err(reject(
                StatusCode::BAD_REQUEST,
                "PGRST100",
                format!("unexpected order direction {other:?}"),
            ))
        }
    };
    Ok((column.to_string(), descending))
}

/// Extract the row id from an `id=eq.<uuid>` filter.
fn parse_id_filter(params: &HashMap<String, String>) -> ApiResult<Uuid> {
    let filter = params
        .get("id")
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "21000", "mutation requires an id filter"))?;
    filter
        .strip_prefix("eq.")
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| {
            let message = format!("invalid id filter {filter:?}");
            reject(StatusCode::BAD_REQUEST, "22P02", message)
        })
}

fn not_found(id: Uuid) -> (StatusCode, Json<ApiError>) {
    reject(StatusCode::NOT_FOUND, "PGRST116", format!("no row with id {id}"))
}

async fn select_tasks(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Vec<Task>>> {
    let order = params.get("order").map_or("created_at.desc", String::as_str);
    let (column, descending) = parse_order(order)?;
    let table = db.read().await;
    let mut tasks: Vec<Task> = table.rows.values().cloned().collect();
    tasks.sort_by(|a, b| {
        let ord = match column.as_str() {
            "updated_at" => a.updated_at.cmp(&b.updated_at),
            "title" => a.title.cmp(&b.title),
            _ => a.created_at.cmp(&b.created_at),
        };
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    Ok(Json(tasks))
}

async fn insert_task(
    State(db): State<Db>,
    Json(input): Json<NewTask>,
) -> ApiResult<(StatusCode, Json<Vec<Task>>)> {
    check_title(&input.title)?;
    let mut table = db.write().await;
    let now = table.stamp();
    let task = Task {
        id: Uuid::new_v4(),
        title: input.title,
        description: input.description,
        completed: input.completed,
        created_at: now,
        updated_at: now,
    };
    log::debug!("insert {}", task.id);
    table.rows.insert(task.id, task.clone());
    Ok((StatusCode::CREATED, Json(vec![task])))
}

async fn update_task(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
    Json(input): Json<TaskPatch>,
) -> ApiResult<Json<Vec<Task>>> {
    let id = parse_id_filter(&params)?;
    if let Some(title) = &input.title {
        check_title(title)?;
    }
    let mut table = db.write().await;
    if !table.rows.contains_key(&id) {
        return Err(not_found(id));
    }
    let now = table.stamp();
    let task = table.rows.get_mut(&id).ok_or_else(|| not_found(id))?;
    if let Some(title) = input.title {
        task.title = title;
    }
    if let Some(description) = input.description {
        task.description = description;
    }
    if let Some(completed) = input.completed {
        task.completed = completed;
    }
    task.updated_at = now;
    log::debug!("update {id}");
    Ok(Json(vec![task.clone()]))
}

async fn delete_task(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Vec<Task>>> {
    let id = parse_id_filter(&params)?;
    let removed = db.write().await.rows.remove(&id).ok_or_else(|| not_found(id))?;
    log::debug!("delete {id}");
    Ok(Json(vec![removed]))
}
