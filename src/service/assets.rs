use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};
use crate::model::asset::{Asset, AssetPatch, NewAsset};
use crate::state::AppState;

pub const DEFAULT_CONDITION: &str = "good";

fn required_text(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

async fn ensure_user(state: &AppState, user_id: u64) -> AppResult<()> {
    match state.store.find_user(user_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("Assigned user not found")),
    }
}

#[instrument(skip(state, asset), fields(asset_name = %asset.asset_name))]
pub async fn create(state: &AppState, asset: NewAsset) -> AppResult<Asset> {
    let asset_name = required_text(&asset.asset_name, "asset_name")?;
    let category = required_text(&asset.category, "category")?;
    if let Some(user_id) = asset.assigned_to {
        ensure_user(state, user_id).await?;
    }

    let created = state
        .store
        .insert_asset(NewAsset {
            asset_name,
            category,
            ..asset
        })
        .await?;
    info!(asset_id = created.id, assigned_to = ?created.assigned_to, "Asset created");
    Ok(created)
}

pub async fn get(state: &AppState, id: u64) -> AppResult<Asset> {
    state
        .store
        .find_asset(id)
        .await?
        .ok_or_else(|| AppError::not_found("Asset not found"))
}

pub async fn list(state: &AppState, assigned_to: Option<u64>) -> AppResult<Vec<Asset>> {
    Ok(state.store.list_assets(assigned_to).await?)
}

#[instrument(skip(state, patch))]
pub async fn update(state: &AppState, id: u64, mut patch: AssetPatch) -> AppResult<Asset> {
    if patch.is_empty() {
        return Err(AppError::validation("No fields provided for update"));
    }
    if let Some(name) = patch.asset_name.as_deref() {
        patch.asset_name = Some(required_text(name, "asset_name")?);
    }
    if let Some(category) = patch.category.as_deref() {
        patch.category = Some(required_text(category, "category")?);
    }
    if let Some(Some(user_id)) = patch.assigned_to {
        ensure_user(state, user_id).await?;
    }

    let updated = state
        .store
        .update_asset(id, &patch)
        .await?
        .ok_or_else(|| AppError::not_found("Asset not found"))?;
    info!(asset_id = id, "Asset updated");
    Ok(updated)
}

pub async fn delete(state: &AppState, id: u64) -> AppResult<()> {
    if !state.store.delete_asset(id).await? {
        return Err(AppError::not_found("Asset not found"));
    }
    info!(asset_id = id, "Asset deleted");
    Ok(())
}

/// Books the next maintenance date; it cannot lie in the past.
pub async fn schedule_maintenance(
    state: &AppState,
    id: u64,
    date: NaiveDate,
    notes: Option<String>,
) -> AppResult<Asset> {
    if date < state.clock.today() {
        return Err(AppError::validation("Maintenance date cannot be in the past"));
    }
    update(
        state,
        id,
        AssetPatch {
            maintenance_schedule: Some(date),
            notes,
            ..Default::default()
        },
    )
    .await
}
