use tracing::info;

use crate::error::{AppError, AppResult};
use crate::model::policy::{NewPolicy, Policy, PolicyPatch, dates_are_ordered};
use crate::state::AppState;

pub const MAX_LIMIT: u64 = 100;

fn check_dates(effective: chrono::NaiveDate, expiry: Option<chrono::NaiveDate>) -> AppResult<()> {
    if !dates_are_ordered(effective, expiry) {
        return Err(AppError::validation("expiry_date cannot be before effective_date"));
    }
    Ok(())
}

pub async fn create(state: &AppState, policy: NewPolicy) -> AppResult<Policy> {
    if policy.title.trim().is_empty() {
        return Err(AppError::validation("title must not be empty"));
    }
    check_dates(policy.effective_date, policy.expiry_date)?;

    let created = state.store.insert_policy(policy).await?;
    info!(policy_id = created.id, created_by = ?created.created_by, "Policy created");
    Ok(created)
}

pub async fn get(state: &AppState, id: u64) -> AppResult<Policy> {
    state
        .store
        .find_policy(id)
        .await?
        .ok_or_else(|| AppError::not_found("Policy not found"))
}

pub async fn list(state: &AppState, skip: Option<u64>, limit: Option<u64>) -> AppResult<Vec<Policy>> {
    let limit = limit.unwrap_or(MAX_LIMIT).clamp(1, MAX_LIMIT);
    Ok(state.store.list_policies(skip.unwrap_or(0), limit).await?)
}

/// Dates are checked against the merged record, so moving only one of them
/// still cannot invert the pair.
pub async fn update(state: &AppState, id: u64, patch: PolicyPatch) -> AppResult<Policy> {
    if patch.is_empty() {
        return Err(AppError::validation("No fields provided for update"));
    }
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::validation("title must not be empty"));
    }

    let mut merged = get(state, id).await?;
    patch.apply(&mut merged);
    check_dates(merged.effective_date, merged.expiry_date)?;

    let updated = state
        .store
        .update_policy(id, &patch)
        .await?
        .ok_or_else(|| AppError::not_found("Policy not found"))?;
    info!(policy_id = id, "Policy updated");
    Ok(updated)
}

pub async fn delete(state: &AppState, id: u64) -> AppResult<()> {
    if !state.store.delete_policy(id).await? {
        return Err(AppError::not_found("Policy not found"));
    }
    info!(policy_id = id, "Policy deleted");
    Ok(())
}
