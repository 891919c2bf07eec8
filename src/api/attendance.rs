use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::attendance::{Attendance, AttendanceFilter};
use crate::model::role::Capability;
use crate::service::attendance::{self, AttendanceSummary};
use crate::state::AppState;
use crate::utils::time_input::{TimeInput, normalize_time};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Body for check-in and check-out. Both fields are optional.
#[derive(Deserialize, ToSchema, Default)]
#[schema(example = json!({"time": "09:05"}))]
pub struct PunchReq {
    /// Defaults to the caller. Punching for someone else needs HR rights.
    #[schema(example = 42)]
    pub employee_id: Option<u64>,
    /// `"17:00"`, `"08:59:30"`, `"5:30 PM"`, an ISO date-time, or
    /// `{"hour": 9, "minute": 15}`. Defaults to the server clock.
    #[schema(value_type = Option<String>, example = "09:05")]
    pub time: Option<TimeInput>,
}

impl PunchReq {
    fn resolve(self, auth: &AuthUser) -> AppResult<(u64, Option<NaiveTime>)> {
        let employee_id = self.employee_id.unwrap_or(auth.user_id);
        auth.require_self_or(employee_id, Capability::ManageUsers)?;
        let at = self.time.as_ref().map(normalize_time).transpose()?;
        Ok((employee_id, at))
    }
}

#[derive(Deserialize, IntoParams)]
pub struct RecordsQuery {
    /// Employees always see their own records
    pub employee_id: Option<u64>,
    /// Inclusive lower bound (YYYY-MM-DD)
    #[param(value_type = Option<String>)]
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound (YYYY-MM-DD)
    #[param(value_type = Option<String>)]
    pub to: Option<NaiveDate>,
}

/// An empty body means "me, now"; anything else must be a valid `PunchReq`.
fn parse_punch(body: &[u8]) -> AppResult<PunchReq> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(PunchReq::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::validation(format!("Invalid attendance payload: {e}")))
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body(content = PunchReq, description = "Optional employee and time; the body may be omitted"),
    responses(
        (status = 201, description = "Checked in", body = Attendance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Already checked in today"),
        (status = 422, description = "Unreadable time value")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    state: web::Data<AppState>,
    config: web::Data<Config>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let (employee_id, at) = parse_punch(&body)?.resolve(&auth)?;
    let record = attendance::check_in(&state, config.workday(), employee_id, at).await?;
    Ok(HttpResponse::Created().json(record))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body(content = PunchReq, description = "Optional employee and time; the body may be omitted"),
    responses(
        (status = 200, description = "Checked out", body = Attendance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No check-in found for today"),
        (status = 409, description = "Already checked out today"),
        (status = 422, description = "Unreadable time, or earlier than the check-in")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    state: web::Data<AppState>,
    config: web::Data<Config>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let (employee_id, at) = parse_punch(&body)?.resolve(&auth)?;
    let record = attendance::check_out(&state, config.workday(), employee_id, at).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    get,
    path = "/api/attendance/today/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee to look up")
    ),
    responses(
        (status = 200, description = "Today's record", body = Attendance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No record today")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_self_or(employee_id, Capability::ViewAllRecords)?;
    Ok(HttpResponse::Ok().json(attendance::today(&state, employee_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/attendance/records",
    params(RecordsQuery),
    responses(
        (status = 200, description = "Attendance history, newest first", body = [Attendance]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "from is after to")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn records(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<RecordsQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let employee_id = if auth.can(Capability::ViewAllRecords) {
        query.employee_id
    } else {
        match query.employee_id {
            Some(id) if id != auth.user_id => {
                return Err(AppError::Forbidden(
                    "Employees can only view their own attendance".to_string(),
                ));
            }
            _ => Some(auth.user_id),
        }
    };

    let list = attendance::records(
        &state,
        AttendanceFilter {
            employee_id,
            from: query.from,
            to: query.to,
        },
    )
    .await?;
    Ok(HttpResponse::Ok().json(list))
}

#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    responses(
        (status = 200, description = "Today's headcount and this month's hours", body = AttendanceSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn summary(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    auth.require(Capability::ViewAllRecords)?;
    Ok(HttpResponse::Ok().json(attendance::summary(&state).await?))
}
