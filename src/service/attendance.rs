use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::attendance::{Attendance, AttendanceFilter, NewAttendance};
use crate::state::AppState;

/// Office hours used to flag late arrivals and early departures.
#[derive(Debug, Clone, Copy)]
pub struct Workday {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Workday {
    pub fn is_late(&self, check_in: NaiveTime) -> bool {
        check_in > self.start
    }

    pub fn is_early(&self, check_out: NaiveTime) -> bool {
        check_out < self.end
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailyHours {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "date": "2024-06-10",
    "total_present": 8,
    "total_users": 10,
    "absentee_percentage": 20.0,
    "late_arrivals": 2,
    "early_exits": 1,
    "monthly_working_hours": [{"date": "2024-06-03", "hours": 61.5}]
}))]
pub struct AttendanceSummary {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub total_present: usize,
    pub total_users: i64,
    pub absentee_percentage: f64,
    pub late_arrivals: usize,
    pub early_exits: usize,
    /// Hours worked by everyone, per day of the current month.
    pub monthly_working_hours: Vec<DailyHours>,
}

#[instrument(skip(state, workday))]
pub async fn check_in(
    state: &AppState,
    workday: Workday,
    employee_id: u64,
    at: Option<NaiveTime>,
) -> AppResult<Attendance> {
    if state.store.find_user(employee_id).await?.is_none() {
        return Err(AppError::not_found("Employee not found"));
    }

    let check_in = at.unwrap_or_else(|| state.clock.time_of_day());
    let record = state
        .store
        .insert_attendance(NewAttendance {
            employee_id,
            date: state.clock.today(),
            check_in,
            late_entry: workday.is_late(check_in),
        })
        .await?;

    info!(attendance_id = record.id, late = record.late_entry, "Checked in");
    Ok(record)
}

#[instrument(skip(state, workday))]
pub async fn check_out(
    state: &AppState,
    workday: Workday,
    employee_id: u64,
    at: Option<NaiveTime>,
) -> AppResult<Attendance> {
    let record = state
        .store
        .attendance_on(employee_id, state.clock.today())
        .await?
        .ok_or_else(|| AppError::not_found("No check-in record found for today"))?;

    if record.check_out.is_some() {
        return Err(AppError::Conflict("Already checked out today".to_string()));
    }

    let check_out = at.unwrap_or_else(|| state.clock.time_of_day());
    if check_out < record.check_in {
        return Err(AppError::validation(format!(
            "Check-out time {check_out} is earlier than check-in time {}",
            record.check_in
        )));
    }

    // a concurrent check-out can win between the read and the write
    let updated = state
        .store
        .record_check_out(record.id, check_out, workday.is_early(check_out))
        .await?
        .ok_or_else(|| AppError::Conflict("Already checked out today".to_string()))?;

    info!(attendance_id = updated.id, early = updated.early_exit, "Checked out");
    Ok(updated)
}

pub async fn today(state: &AppState, employee_id: u64) -> AppResult<Attendance> {
    state
        .store
        .attendance_on(employee_id, state.clock.today())
        .await?
        .ok_or_else(|| AppError::not_found("No attendance record for today"))
}

pub async fn records(state: &AppState, filter: AttendanceFilter) -> AppResult<Vec<Attendance>> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(AppError::validation("from cannot be after to"));
        }
    }
    Ok(state.store.list_attendance(&filter).await?)
}

pub async fn summary(state: &AppState) -> AppResult<AttendanceSummary> {
    let today = state.clock.today();
    let month_start = today.with_day(1).unwrap_or(today);

    let month = state
        .store
        .list_attendance(&AttendanceFilter {
            employee_id: None,
            from: Some(month_start),
            to: Some(today),
        })
        .await?;
    let total_users = state.store.count_users().await?;

    let todays: Vec<&Attendance> = month.iter().filter(|a| a.date == today).collect();
    let total_present = todays.len();
    let absentee_percentage = if total_users > 0 {
        let absent = (total_users - total_present as i64).max(0);
        (absent as f64 / total_users as f64 * 10_000.0).round() / 100.0
    } else {
        0.0
    };

    let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in &month {
        *per_day.entry(record.date).or_default() += record.worked_hours();
    }

    Ok(AttendanceSummary {
        date: today,
        total_present,
        total_users,
        absentee_percentage,
        late_arrivals: todays.iter().filter(|a| a.late_entry).count(),
        early_exits: todays.iter().filter(|a| a.early_exit).count(),
        monthly_working_hours: per_day
            .into_iter()
            .map(|(date, hours)| DailyHours {
                date,
                hours: (hours * 100.0).round() / 100.0,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::service::test_support::{state_at, user};

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn office() -> Workday {
        Workday {
            start: t("09:00"),
            end: t("17:00"),
        }
    }

    #[actix_web::test]
    async fn late_check_in_and_early_check_out_are_flagged() {
        let (state, _) = state_at("2024-06-10", "09:05");
        let emp = user(&state, Role::Employee, "emp@example.com").await;

        let record = check_in(&state, office(), emp.id, None).await.unwrap();
        assert_eq!(record.check_in, t("09:05"));
        assert!(record.late_entry);

        let record = check_out(&state, office(), emp.id, Some(t("16:30"))).await.unwrap();
        assert!(record.early_exit);
        assert!((record.worked_hours() - 7.4167).abs() < 0.001);
    }

    #[actix_web::test]
    async fn on_time_day_has_no_flags() {
        let (state, _) = state_at("2024-06-10", "08:00");
        let emp = user(&state, Role::Employee, "emp@example.com").await;

        let record = check_in(&state, office(), emp.id, Some(t("09:00"))).await.unwrap();
        assert!(!record.late_entry);
        let record = check_out(&state, office(), emp.id, Some(t("17:00"))).await.unwrap();
        assert!(!record.early_exit);
    }

    #[actix_web::test]
    async fn one_check_in_and_one_check_out_per_day() {
        let (state, _) = state_at("2024-06-10", "08:00");
        let emp = user(&state, Role::Employee, "emp@example.com").await;

        assert!(matches!(
            check_out(&state, office(), emp.id, None).await,
            Err(AppError::NotFound(_))
        ));

        check_in(&state, office(), emp.id, None).await.unwrap();
        assert!(matches!(
            check_in(&state, office(), emp.id, None).await,
            Err(AppError::Conflict(_))
        ));

        check_out(&state, office(), emp.id, Some(t("17:30"))).await.unwrap();
        assert!(matches!(
            check_out(&state, office(), emp.id, Some(t("18:00"))).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[actix_web::test]
    async fn check_out_before_check_in_is_invalid() {
        let (state, _) = state_at("2024-06-10", "08:00");
        let emp = user(&state, Role::Employee, "emp@example.com").await;
        check_in(&state, office(), emp.id, Some(t("10:00"))).await.unwrap();

        assert!(matches!(
            check_out(&state, office(), emp.id, Some(t("09:30"))).await,
            Err(AppError::Validation(_))
        ));
    }

    #[actix_web::test]
    async fn unknown_employee_cannot_check_in() {
        let (state, _) = state_at("2024-06-10", "08:00");
        assert!(matches!(
            check_in(&state, office(), 404, None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn records_reject_inverted_range() {
        let (state, _) = state_at("2024-06-10", "08:00");
        let filter = AttendanceFilter {
            employee_id: None,
            from: NaiveDate::from_ymd_opt(2024, 6, 10),
            to: NaiveDate::from_ymd_opt(2024, 6, 1),
        };
        assert!(matches!(records(&state, filter).await, Err(AppError::Validation(_))));
    }

    #[actix_web::test]
    async fn summary_counts_today_and_sums_hours_per_day() {
        let (state, _) = state_at("2024-06-10", "08:00");
        let a = user(&state, Role::Employee, "a@example.com").await;
        let b = user(&state, Role::Employee, "b@example.com").await;
        user(&state, Role::Employee, "c@example.com").await;
        user(&state, Role::Hr, "hr@example.com").await;

        check_in(&state, office(), a.id, Some(t("09:30"))).await.unwrap();
        check_out(&state, office(), a.id, Some(t("17:30"))).await.unwrap();
        check_in(&state, office(), b.id, Some(t("08:45"))).await.unwrap();
        check_out(&state, office(), b.id, Some(t("16:45"))).await.unwrap();

        let report = summary(&state).await.unwrap();
        assert_eq!(report.total_present, 2);
        assert_eq!(report.total_users, 4);
        assert_eq!(report.absentee_percentage, 50.0);
        assert_eq!(report.late_arrivals, 1);
        assert_eq!(report.early_exits, 1);
        assert_eq!(report.monthly_working_hours.len(), 1);
        assert_eq!(report.monthly_working_hours[0].hours, 16.0);
    }

    #[actix_web::test]
    async fn summary_with_no_users_reports_zero_absence() {
        let (state, _) = state_at("2024-06-10", "08:00");
        let report = summary(&state).await.unwrap();
        assert_eq!(report.total_users, 0);
        assert_eq!(report.absentee_percentage, 0.0);
        assert!(report.monthly_working_hours.is_empty());
    }
}
