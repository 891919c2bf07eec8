use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::model::notification::Notification;
use crate::state::AppState;

pub async fn list(state: &AppState, user_id: u64) -> AppResult<Vec<Notification>> {
    Ok(state.store.notifications_for(user_id).await?)
}

pub async fn unread_count(state: &AppState, user_id: u64) -> AppResult<i64> {
    Ok(state.store.unread_count(user_id).await?)
}

/// Marks one of the caller's notifications as read. Someone else's id looks
/// exactly like a missing one.
pub async fn mark_read(state: &AppState, user_id: u64, id: u64) -> AppResult<()> {
    if !state.store.mark_notification_read(user_id, id).await? {
        return Err(AppError::not_found("Notification not found"));
    }
    Ok(())
}

pub async fn mark_all_read(state: &AppState, user_id: u64) -> AppResult<u64> {
    let updated = state.store.mark_all_notifications_read(user_id).await?;
    debug!(user_id, updated, "Notifications marked read");
    Ok(updated)
}
