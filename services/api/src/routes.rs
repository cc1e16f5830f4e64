//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::ApiResult,
    middleware::{CurrentUser, require_session},
    models::{MarkDone, NewReport, ReportChanges},
    notifications::{self, NotificationView},
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/posts", post(create_post))
        .route("/posts/:id", put(update_post).delete(delete_post))
        .route("/posts/:id/done", put(mark_done))
        .route("/notifications", get(list_notifications))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/posts", get(list_posts))
        .route("/posts/:id", get(get_post))
        .route("/locations", get(list_locations))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

/// All reports, newest first
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.engine.list_reports().await?))
}

pub async fn get_post(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    Ok(Json(state.engine.get_report(id).await?))
}

/// Distinct locations for filtering
pub async fn list_locations(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.engine.list_locations().await?))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    payload: Result<Json<NewReport>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(report) = payload?;
    let report = state.engine.create_report(actor, &report).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn update_post(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ReportChanges>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    let Json(changes) = payload?;
    Ok(Json(state.engine.update_report(actor, id, changes).await?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    state.engine.delete_report(actor, id).await?;
    Ok(Json(json!({"message": "Report deleted"})))
}

/// Mark a report as claimed
pub async fn mark_done(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<MarkDone>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    let Json(claim) = payload?;
    Ok(Json(state.engine.mark_done(actor, id, &claim).await?))
}

/// Notifications for admins, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();
    let views: Vec<NotificationView> = state
        .engine
        .list_notifications(actor)
        .await?
        .iter()
        .map(|record| notifications::present(record, now))
        .collect();

    Ok(Json(views))
}
