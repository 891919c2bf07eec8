use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 3,
    "user_id": 42,
    "message": "Your sick leave request from 2024-06-10 to 2024-06-12 has been approved.",
    "is_read": false,
    "created_at": "2024-06-02T10:00:00Z"
}))]
pub struct Notification {
    pub id: u64,
    pub user_id: u64,
    pub message: String,
    pub is_read: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: u64,
    pub message: String,
}
