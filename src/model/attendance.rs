use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 42,
    "date": "2024-06-10",
    "check_in": "09:05:00",
    "check_out": "16:30:00",
    "status": "present",
    "late_entry": true,
    "early_exit": true,
    "created_at": "2024-06-10T09:05:00Z",
    "updated_at": "2024-06-10T16:30:00Z"
}))]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "09:00:00")]
    pub check_in: NaiveTime,
    #[schema(value_type = Option<String>, example = "17:00:00")]
    pub check_out: Option<NaiveTime>,
    pub status: String,
    pub late_entry: bool,
    pub early_exit: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl Attendance {
    /// Hours between check-in and check-out, zero while still checked in.
    pub fn worked_hours(&self) -> f64 {
        match self.check_out {
            Some(out) if out > self.check_in => (out - self.check_in).num_seconds() as f64 / 3600.0,
            _ => 0.0,
        }
    }
}

pub const STATUS_PRESENT: &str = "present";

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub check_in: NaiveTime,
    pub late_entry: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub employee_id: Option<u64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AttendanceFilter {
    pub fn matches(&self, record: &Attendance) -> bool {
        self.employee_id.is_none_or(|id| record.employee_id == id)
            && self.from.is_none_or(|from| record.date >= from)
            && self.to.is_none_or(|to| record.date <= to)
    }
}
