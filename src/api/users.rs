use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppResult;
use crate::model::role::{Capability, Role};
use crate::model::user::User;
use crate::service::{
    Page,
    users::{self, CreateUser, UpdateUser},
};
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateUserReq {
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[schema(example = "changeme123")]
    pub password: String,
    #[schema(example = "John Employee")]
    pub full_name: String,
    /// Defaults to `employee`
    #[schema(example = "employee")]
    pub role: Option<Role>,
    #[schema(example = "EMP001")]
    pub employee_code: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "IT")]
    pub department: Option<String>,
    #[schema(example = "Software Developer")]
    pub position: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub hire_date: Option<NaiveDate>,
}

/// Every field is optional; at least one must be present.
#[derive(Deserialize, ToSchema)]
pub struct UpdateUserReq {
    #[schema(format = "email")]
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub employee_code: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    #[schema(format = "date", value_type = Option<String>)]
    pub hire_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, IntoParams)]
pub struct UserQuery {
    /// Filter by role
    #[param(value_type = Option<String>, example = "employee")]
    pub role: Option<Role>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<User>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserReq,
    responses(
        (status = 201, description = "User created with a seeded leave ledger", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Email or employee code already exists"),
        (status = 422, description = "Invalid input")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn create_user(
    auth: AuthUser,
    state: web::Data<AppState>,
    config: web::Data<Config>,
    payload: web::Json<CreateUserReq>,
) -> AppResult<HttpResponse> {
    auth.require(Capability::ManageUsers)?;

    let req = payload.into_inner();
    let user = users::create_user(
        &state,
        config.leave_seed,
        CreateUser {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            role: req.role.unwrap_or(Role::Employee),
            employee_code: req.employee_code,
            phone: req.phone,
            department: req.department,
            position: req.position,
            hire_date: req.hire_date,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(user))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Paginated user list", body = UserListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> AppResult<HttpResponse> {
    auth.require(Capability::ManageUsers)?;

    let page = Page::new(query.page, query.per_page);
    let (data, total) = users::list_users(&state, query.role, page).await?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The caller's profile", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Account no longer exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn me(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(users::get_user(&state, auth.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = u64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn get_user(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    auth.require_self_or(id, Capability::ViewAllRecords)?;
    Ok(HttpResponse::Ok().json(users::get_user(&state, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(
        ("id" = u64, Path, description = "User ID")
    ),
    request_body = UpdateUserReq,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email or employee code already exists"),
        (status = 422, description = "No fields, or invalid values")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<UpdateUserReq>,
) -> AppResult<HttpResponse> {
    auth.require(Capability::ManageUsers)?;

    let req = payload.into_inner();
    let user = users::update_user(
        &state,
        path.into_inner(),
        UpdateUser {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            role: req.role,
            employee_code: req.employee_code,
            phone: req.phone,
            department: req.department,
            position: req.position,
            hire_date: req.hire_date,
            is_active: req.is_active,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(user))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(
        ("id" = u64, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User and dependent records removed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Attempt to delete one's own account")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn delete_user(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require(Capability::ManageUsers)?;
    users::delete_user(&state, auth.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
