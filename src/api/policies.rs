use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::model::policy::{NewPolicy, Policy, PolicyPatch};
use crate::model::role::Capability;
use crate::service::policies;
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreatePolicyReq {
    #[schema(example = "Remote work")]
    pub title: String,
    #[schema(example = "Who may work remotely and how")]
    #[serde(default)]
    pub description: String,
    #[schema(example = "Employees may work remotely up to two days a week.")]
    #[serde(default)]
    pub content: String,
    #[schema(example = "workplace")]
    #[serde(default)]
    pub category: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub effective_date: NaiveDate,
    #[schema(format = "date", value_type = Option<String>)]
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePolicyReq {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    #[schema(format = "date", value_type = Option<String>)]
    pub effective_date: Option<NaiveDate>,
    #[schema(format = "date", value_type = Option<String>)]
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams)]
pub struct PolicyQuery {
    /// Rows to skip
    pub skip: Option<u64>,
    /// Rows to return, at most 100
    pub limit: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/policies",
    request_body = CreatePolicyReq,
    responses(
        (status = 201, description = "Policy created", body = Policy),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Expiry precedes the effective date")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Policies"
)]
pub async fn create_policy(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreatePolicyReq>,
) -> AppResult<HttpResponse> {
    auth.require(Capability::ManagePolicies)?;

    let req = payload.into_inner();
    let policy = policies::create(
        &state,
        NewPolicy {
            title: req.title,
            description: req.description,
            content: req.content,
            category: req.category,
            effective_date: req.effective_date,
            expiry_date: req.expiry_date,
            created_by: auth.user_id,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(policy))
}

#[utoipa::path(
    get,
    path = "/api/policies",
    params(PolicyQuery),
    responses(
        (status = 200, description = "Policies", body = [Policy]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Policies"
)]
pub async fn list_policies(
    _auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<PolicyQuery>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(policies::list(&state, query.skip, query.limit).await?))
}

#[utoipa::path(
    get,
    path = "/api/policies/{id}",
    params(
        ("id" = u64, Path, description = "Policy ID")
    ),
    responses(
        (status = 200, description = "Policy found", body = Policy),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Policy not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Policies"
)]
pub async fn get_policy(
    _auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(policies::get(&state, path.into_inner()).await?))
}

#[utoipa::path(
    put,
    path = "/api/policies/{id}",
    params(
        ("id" = u64, Path, description = "Policy ID")
    ),
    request_body = UpdatePolicyReq,
    responses(
        (status = 200, description = "Policy updated", body = Policy),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Policy not found"),
        (status = 422, description = "No fields, or dates out of order")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Policies"
)]
pub async fn update_policy(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<UpdatePolicyReq>,
) -> AppResult<HttpResponse> {
    auth.require(Capability::ManagePolicies)?;

    let req = payload.into_inner();
    let policy = policies::update(
        &state,
        path.into_inner(),
        PolicyPatch {
            title: req.title,
            description: req.description,
            content: req.content,
            category: req.category,
            effective_date: req.effective_date,
            expiry_date: req.expiry_date,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(policy))
}

#[utoipa::path(
    delete,
    path = "/api/policies/{id}",
    params(
        ("id" = u64, Path, description = "Policy ID")
    ),
    responses(
        (status = 204, description = "Policy deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Policy not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Policies"
)]
pub async fn delete_policy(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require(Capability::ManagePolicies)?;
    policies::delete(&state, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
