use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "title": "Remote work",
    "description": "Who may work remotely and how",
    "content": "Employees may work remotely up to two days a week.",
    "category": "workplace",
    "effective_date": "2024-01-01",
    "expiry_date": null,
    "created_by": 1,
    "created_at": "2024-01-01T00:00:00Z",
    "updated_at": "2024-01-01T00:00:00Z"
}))]
pub struct Policy {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub content: String,
    pub category: String,
    #[schema(value_type = String, format = "date")]
    pub effective_date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date")]
    pub expiry_date: Option<NaiveDate>,
    pub created_by: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPolicy {
    pub title: String,
    pub description: String,
    pub content: String,
    pub category: String,
    pub effective_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub created_by: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PolicyPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
}

impl PolicyPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.effective_date.is_none()
            && self.expiry_date.is_none()
    }

    pub fn apply(&self, policy: &mut Policy) {
        if let Some(v) = &self.title {
            policy.title = v.clone();
        }
        if let Some(v) = &self.description {
            policy.description = v.clone();
        }
        if let Some(v) = &self.content {
            policy.content = v.clone();
        }
        if let Some(v) = &self.category {
            policy.category = v.clone();
        }
        if let Some(v) = self.effective_date {
            policy.effective_date = v;
        }
        if let Some(v) = self.expiry_date {
            policy.expiry_date = Some(v);
        }
    }
}

/// Expiry, when present, may not precede the effective date.
pub fn dates_are_ordered(effective: NaiveDate, expiry: Option<NaiveDate>) -> bool {
    expiry.is_none_or(|expiry| expiry >= effective)
}
