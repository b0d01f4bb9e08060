//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::HeaderMap,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::{
    error::ApiError,
    middleware::{CurrentUser, auth_middleware},
    models::{NewTask, SortDirection, TaskFilter, TaskPatch, TaskSort, TelegramProfile},
    session::SESSION_COOKIE,
    state::AppState,
};

/// Query parameters for task listings
#[derive(Deserialize, Default)]
pub struct TaskListQuery {
    pub filter: Option<String>,
    pub order: Option<String>,
    pub direction: Option<String>,
}

/// Request to create a task
#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i32>,
    pub due_date: Option<NaiveDate>,
}

/// Request to set a task's completion flag
#[derive(Deserialize)]
pub struct ToggleTaskRequest {
    pub completed: Option<bool>,
}

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let task_routes = Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id", put(update_task).delete(delete_task))
        .route("/:id/toggle", patch(toggle_task))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/config", get(get_config))
        .route("/api/auth/telegram", post(telegram_login))
        .route("/api/auth/check", get(auth_check))
        .route("/api/auth/logout", post(logout))
        .nest("/api/tasks", task_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "todo-api"
    }))
}

/// Client bootstrap configuration
pub async fn get_config(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let app_url = state.config.app_url.clone().or_else(|| {
        headers
            .get(axum::http::header::HOST)
            .and_then(|host| host.to_str().ok())
            .map(|host| format!("https://{}", host))
    });

    Json(json!({
        "botUsername": state.config.bot_username,
        "appUrl": app_url,
    }))
}

/// Log in with a Telegram login payload.
///
/// Verifies the payload signature, upserts the user row and opens a
/// session delivered as an HttpOnly cookie.
pub async fn telegram_login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(bad_body)?;

    let auth = state.verifier.verify(&payload).map_err(|rejection| {
        warn!("Rejected Telegram login: {}", rejection);
        ApiError::InvalidAuth
    })?;

    if !state.config.is_user_allowed(auth.telegram_id) {
        warn!("Telegram user {} is not on the allow-list", auth.telegram_id);
        return Err(ApiError::Forbidden);
    }

    let user = state
        .user_repository
        .upsert(
            auth.telegram_id,
            auth.first_name.as_deref(),
            auth.last_name.as_deref(),
            auth.username.as_deref(),
        )
        .await?;

    let profile = TelegramProfile::from(&user);
    let token = state
        .sessions
        .create(user.id, user.telegram_id, profile.clone())
        .await;

    info!("User {} logged in", user.id);

    let jar = jar.add(session_cookie(&state, token));
    Ok((
        jar,
        Json(json!({
            "success": true,
            "user": profile,
        })),
    ))
}

/// Report whether the request carries a live session
pub async fn auth_check(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let session = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.resolve(cookie.value()).await,
        None => None,
    };

    match session {
        Some(session) => Json(json!({
            "success": true,
            "user": session.profile,
        })),
        None => Json(json!({
            "success": false,
            "user": null,
        })),
    }
}

/// Destroy the current session and clear its cookie
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.destroy(cookie.value()).await;
    }

    let jar = jar.remove(removal_cookie());
    (jar, Json(json!({ "success": true })))
}

/// List the caller's tasks together with their stats
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<TaskListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = TaskFilter::from_param(query.filter.as_deref().unwrap_or("all"));
    let sort = TaskSort::from_param(query.order.as_deref().unwrap_or("created_at"));
    let direction = SortDirection::from_param(query.direction.as_deref().unwrap_or("DESC"));

    let tasks = state
        .task_repository
        .list(user.user_id, filter, sort, direction)
        .await?;
    let stats = state.task_repository.stats(user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "tasks": tasks,
        "stats": stats,
    })))
}

/// Create a new task for the caller
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(bad_body)?;

    let title = payload.title.as_deref().unwrap_or("").trim().to_string();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    let new_task = NewTask {
        title,
        description: payload
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        priority: payload.priority.unwrap_or(2),
        due_date: payload.due_date,
    };

    let task = state.task_repository.create(user.user_id, &new_task).await?;

    Ok(Json(json!({
        "success": true,
        "task": task,
    })))
}

/// Apply a partial update to one of the caller's tasks
pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(task_id): Path<i32>,
    patch: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(patch) = patch.map_err(bad_body)?;

    let task = state
        .task_repository
        .update(task_id, user.user_id, &patch)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;

    Ok(Json(json!({
        "success": true,
        "task": task,
    })))
}

/// Delete one of the caller's tasks
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(task_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .task_repository
        .delete(task_id, user.user_id)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;

    Ok(Json(json!({ "success": true })))
}

/// Set the completion flag on one of the caller's tasks
pub async fn toggle_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(task_id): Path<i32>,
    payload: Result<Json<ToggleTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // A body whose `completed` is not a boolean fails deserialization;
    // report it the same way as a missing field, not as a bare 422.
    let completed = payload
        .map_err(|rejection| match rejection {
            JsonRejection::JsonDataError(_) => {
                ApiError::BadRequest("Completed status is required".to_string())
            }
            other => bad_body(other),
        })?
        .0
        .completed
        .ok_or_else(|| ApiError::BadRequest("Completed status is required".to_string()))?;

    let task = state
        .task_repository
        .set_completed(task_id, user.user_id, completed)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;

    Ok(Json(json!({
        "success": true,
        "task": task,
    })))
}

/// Map a JSON body rejection into the structured 400 shape
fn bad_body(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(state.config.cookie_secure);
    cookie.set_max_age(time::Duration::seconds(state.sessions.ttl_secs()));
    cookie
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie
}
