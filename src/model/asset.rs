use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "asset_name": "ThinkPad T14",
    "category": "laptop",
    "department": "IT",
    "condition": "good",
    "assigned_to": 42,
    "purchase_date": "2024-01-15",
    "warranty_expiry": "2027-01-15",
    "maintenance_schedule": null,
    "notes": null,
    "created_at": "2024-01-15T00:00:00Z",
    "updated_at": "2024-01-15T00:00:00Z"
}))]
pub struct Asset {
    pub id: u64,
    pub asset_name: String,
    pub category: String,
    pub department: Option<String>,
    pub condition: String,
    pub assigned_to: Option<u64>,
    #[schema(value_type = Option<String>, format = "date")]
    pub purchase_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub warranty_expiry: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub maintenance_schedule: Option<NaiveDate>,
    pub notes: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAsset {
    pub asset_name: String,
    pub category: String,
    pub department: Option<String>,
    pub condition: String,
    pub assigned_to: Option<u64>,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_expiry: Option<NaiveDate>,
    pub maintenance_schedule: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Partial update. `assigned_to: Some(None)` unassigns the asset.
#[derive(Debug, Clone, Default)]
pub struct AssetPatch {
    pub asset_name: Option<String>,
    pub category: Option<String>,
    pub department: Option<String>,
    pub condition: Option<String>,
    pub assigned_to: Option<Option<u64>>,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_expiry: Option<NaiveDate>,
    pub maintenance_schedule: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl AssetPatch {
    pub fn is_empty(&self) -> bool {
        self.asset_name.is_none()
            && self.category.is_none()
            && self.department.is_none()
            && self.condition.is_none()
            && self.assigned_to.is_none()
            && self.purchase_date.is_none()
            && self.warranty_expiry.is_none()
            && self.maintenance_schedule.is_none()
            && self.notes.is_none()
    }

    pub fn apply(&self, asset: &mut Asset) {
        if let Some(v) = &self.asset_name {
            asset.asset_name = v.clone();
        }
        if let Some(v) = &self.category {
            asset.category = v.clone();
        }
        if let Some(v) = &self.department {
            asset.department = Some(v.clone());
        }
        if let Some(v) = &self.condition {
            asset.condition = v.clone();
        }
        if let Some(v) = self.assigned_to {
            asset.assigned_to = v;
        }
        if let Some(v) = self.purchase_date {
            asset.purchase_date = Some(v);
        }
        if let Some(v) = self.warranty_expiry {
            asset.warranty_expiry = Some(v);
        }
        if let Some(v) = self.maintenance_schedule {
            asset.maintenance_schedule = Some(v);
        }
        if let Some(v) = &self.notes {
            asset.notes = Some(v.clone());
        }
    }
}
