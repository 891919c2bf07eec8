use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::asset::{Asset, AssetPatch, NewAsset};
use crate::model::role::Capability;
use crate::service::assets::{self, DEFAULT_CONDITION};
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize, ToSchema)]
pub struct CreateAssetReq {
    #[schema(example = "ThinkPad T14")]
    pub asset_name: String,
    #[schema(example = "laptop")]
    pub category: String,
    #[schema(example = "IT")]
    pub department: Option<String>,
    /// Defaults to `good`
    #[schema(example = "good")]
    pub condition: Option<String>,
    #[schema(example = 42)]
    pub assigned_to: Option<u64>,
    #[schema(example = "2026-01-15", format = "date", value_type = Option<String>)]
    pub purchase_date: Option<NaiveDate>,
    #[schema(example = "2029-01-15", format = "date", value_type = Option<String>)]
    pub warranty_expiry: Option<NaiveDate>,
    #[schema(format = "date", value_type = Option<String>)]
    pub maintenance_schedule: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Every field is optional. `"assigned_to": null` unassigns the asset.
#[derive(Deserialize, ToSchema)]
pub struct UpdateAssetReq {
    pub asset_name: Option<String>,
    pub category: Option<String>,
    pub department: Option<String>,
    pub condition: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<u64>)]
    pub assigned_to: Option<Option<u64>>,
    #[schema(format = "date", value_type = Option<String>)]
    pub purchase_date: Option<NaiveDate>,
    #[schema(format = "date", value_type = Option<String>)]
    pub warranty_expiry: Option<NaiveDate>,
    #[schema(format = "date", value_type = Option<String>)]
    pub maintenance_schedule: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct MaintenanceReq {
    #[schema(example = "2026-07-01", format = "date", value_type = String)]
    pub maintenance_date: NaiveDate,
    #[schema(example = "Battery replacement")]
    pub notes: Option<String>,
}

/// Non-HR callers may only see assets assigned to them.
fn ensure_visible(auth: &AuthUser, asset: &Asset) -> AppResult<()> {
    if auth.can(Capability::ManageAssets) || asset.assigned_to == Some(auth.user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not authorized to view this asset".to_string()))
    }
}

#[utoipa::path(
    post,
    path = "/api/assets",
    request_body = CreateAssetReq,
    responses(
        (status = 201, description = "Asset created", body = Asset),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Assigned user not found"),
        (status = 422, description = "Invalid input")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Assets"
)]
pub async fn create_asset(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateAssetReq>,
) -> AppResult<HttpResponse> {
    auth.require(Capability::ManageAssets)?;

    let req = payload.into_inner();
    let asset = assets::create(
        &state,
        NewAsset {
            asset_name: req.asset_name,
            category: req.category,
            department: req.department,
            condition: req.condition.unwrap_or_else(|| DEFAULT_CONDITION.to_string()),
            assigned_to: req.assigned_to,
            purchase_date: req.purchase_date,
            warranty_expiry: req.warranty_expiry,
            maintenance_schedule: req.maintenance_schedule,
            notes: req.notes,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(asset))
}

#[utoipa::path(
    get,
    path = "/api/assets",
    responses(
        (status = 200, description = "All assets for HR, otherwise the caller's", body = [Asset]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Assets"
)]
pub async fn list_assets(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let assigned_to = if auth.can(Capability::ManageAssets) {
        None
    } else {
        Some(auth.user_id)
    };
    Ok(HttpResponse::Ok().json(assets::list(&state, assigned_to).await?))
}

#[utoipa::path(
    get,
    path = "/api/assets/user/{user_id}",
    params(
        ("user_id" = u64, Path, description = "Assignee")
    ),
    responses(
        (status = 200, description = "Assets assigned to the user", body = [Asset]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Assets"
)]
pub async fn user_assets(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    auth.require_self_or(user_id, Capability::ManageAssets)?;
    Ok(HttpResponse::Ok().json(assets::list(&state, Some(user_id)).await?))
}

#[utoipa::path(
    get,
    path = "/api/assets/{id}",
    params(
        ("id" = u64, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "Asset found", body = Asset),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Asset not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Assets"
)]
pub async fn get_asset(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let asset = assets::get(&state, path.into_inner()).await?;
    ensure_visible(&auth, &asset)?;
    Ok(HttpResponse::Ok().json(asset))
}

#[utoipa::path(
    put,
    path = "/api/assets/{id}",
    params(
        ("id" = u64, Path, description = "Asset ID")
    ),
    request_body = UpdateAssetReq,
    responses(
        (status = 200, description = "Asset updated", body = Asset),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Asset or assigned user not found"),
        (status = 422, description = "No fields, or invalid values")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Assets"
)]
pub async fn update_asset(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAssetReq>,
) -> AppResult<HttpResponse> {
    auth.require(Capability::ManageAssets)?;

    let req = payload.into_inner();
    let asset = assets::update(
        &state,
        path.into_inner(),
        AssetPatch {
            asset_name: req.asset_name,
            category: req.category,
            department: req.department,
            condition: req.condition,
            assigned_to: req.assigned_to,
            purchase_date: req.purchase_date,
            warranty_expiry: req.warranty_expiry,
            maintenance_schedule: req.maintenance_schedule,
            notes: req.notes,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(asset))
}

#[utoipa::path(
    delete,
    path = "/api/assets/{id}",
    params(
        ("id" = u64, Path, description = "Asset ID")
    ),
    responses(
        (status = 204, description = "Asset deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Asset not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Assets"
)]
pub async fn delete_asset(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require(Capability::ManageAssets)?;
    assets::delete(&state, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/assets/{id}/maintenance",
    params(
        ("id" = u64, Path, description = "Asset ID")
    ),
    request_body = MaintenanceReq,
    responses(
        (status = 200, description = "Maintenance scheduled", body = Asset),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Asset not found"),
        (status = 422, description = "Date in the past")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Assets"
)]
pub async fn schedule_maintenance(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<MaintenanceReq>,
) -> AppResult<HttpResponse> {
    auth.require(Capability::ManageAssets)?;

    let req = payload.into_inner();
    let asset =
        assets::schedule_maintenance(&state, path.into_inner(), req.maintenance_date, req.notes)
            .await?;
    Ok(HttpResponse::Ok().json(asset))
}
