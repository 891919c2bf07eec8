use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::model::notification::Notification;
use crate::models::MessageResponse;
use crate::service::notifications;
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UnreadCount {
    #[schema(example = 3)]
    pub count: i64,
}

#[derive(Serialize, ToSchema)]
pub struct MarkedRead {
    #[schema(example = 3)]
    pub updated: u64,
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = [Notification]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notifications"
)]
pub async fn list(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(notifications::list(&state, auth.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Number of unread notifications", body = UnreadCount),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notifications"
)]
pub async fn unread_count(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let count = notifications::unread_count(&state, auth.user_id).await?;
    Ok(HttpResponse::Ok().json(UnreadCount { count }))
}

#[utoipa::path(
    put,
    path = "/api/notifications/{id}/mark-read",
    params(
        ("id" = u64, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Marked as read", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notifications"
)]
pub async fn mark_read(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    notifications::mark_read(&state, auth.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Notification marked as read")))
}

#[utoipa::path(
    put,
    path = "/api/notifications/mark-all-read",
    responses(
        (status = 200, description = "How many notifications changed", body = MarkedRead),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notifications"
)]
pub async fn mark_all_read(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let updated = notifications::mark_all_read(&state, auth.user_id).await?;
    Ok(HttpResponse::Ok().json(MarkedRead { updated }))
}
