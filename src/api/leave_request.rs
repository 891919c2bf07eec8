use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::leave::{
    AdjustMode, BalanceAdjustment, LeaveBalance, LeaveDecision, LeaveRequest, LeaveStatus,
    LeaveType,
};
use crate::model::role::Capability;
use crate::service::{
    Page,
    leave::{self, BalanceReport, CreateLeave},
};
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeaveReq {
    /// Defaults to the caller. Filing for someone else needs HR rights.
    #[schema(example = 42)]
    pub employee_id: Option<u64>,
    #[schema(example = "sick")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Flu")]
    #[serde(default)]
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "data": [{
        "id": 7,
        "employee_id": 42,
        "leave_type": "sick",
        "start_date": "2026-01-01",
        "end_date": "2026-01-03",
        "reason": "Flu",
        "status": "pending",
        "days_deducted": 0.0,
        "decided_by": null,
        "created_at": "2025-12-20T09:00:00Z",
        "updated_at": "2025-12-20T09:00:00Z"
    }],
    "page": 1,
    "per_page": 10,
    "total": 1
}))]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveQuery {
    /// Filter by employee ID (HR only; employees always see their own)
    #[schema(example = 42)]
    pub employee_id: Option<u64>,
    /// Filter by leave status
    #[schema(example = "pending", value_type = Option<String>)]
    pub status: Option<LeaveStatus>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

/// Outcome of an approve/reject call.
#[derive(Serialize, ToSchema)]
pub struct DecisionResponse {
    pub request: LeaveRequest,
    /// Ledger after the deduction; absent for rejections.
    pub balance: Option<LeaveBalance>,
}

#[derive(Deserialize, ToSchema)]
#[schema(example = json!({"mode": "add", "annual": 2.0}))]
pub struct AdjustBalanceReq {
    pub mode: AdjustMode,
    pub annual: Option<f64>,
    pub sick: Option<f64>,
    pub casual: Option<f64>,
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave/request",
    request_body(
        content = CreateLeaveReq,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Filing for another employee without HR rights"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Insufficient leave balance"),
        (status = 422, description = "Invalid dates or leave type")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeaveReq>,
) -> AppResult<HttpResponse> {
    let req = payload.into_inner();
    let employee_id = req.employee_id.unwrap_or(auth.user_id);
    auth.require_self_or(employee_id, Capability::ManageUsers)?;

    let request = leave::create_request(
        &state,
        config.leave_seed,
        CreateLeave {
            employee_id,
            leave_type: req.leave_type,
            start_date: req.start_date,
            end_date: req.end_date,
            reason: req.reason,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(request))
}

async fn decide(
    auth: AuthUser,
    state: web::Data<AppState>,
    config: web::Data<Config>,
    leave_id: u64,
    decision: LeaveDecision,
) -> AppResult<HttpResponse> {
    auth.require(Capability::ApproveLeave)?;

    let outcome = leave::decide(
        &state,
        config.decision_rules(),
        auth.user_id,
        leave_id,
        decision,
    )
    .await?;

    Ok(HttpResponse::Ok().json(DecisionResponse {
        request: outcome.request,
        balance: outcome.balance,
    }))
}

/* =========================
Approve leave (HR)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/request/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved and balance deducted", body = DecisionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request already decided, or balance short under the block policy")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    decide(auth, state, config, path.into_inner(), LeaveDecision::Approve).await
}

/* =========================
Reject leave (HR)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/request/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = DecisionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request already decided")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    decide(auth, state, config, path.into_inner(), LeaveDecision::Reject).await
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/request/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found, or filed by someone else")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let request = leave::get_request(&state, path.into_inner()).await?;
    // other people's requests look missing so ids cannot be enumerated
    if auth.require_self_or(request.employee_id, Capability::ViewAllRecords).is_err() {
        return Err(AppError::not_found("Leave request not found"));
    }
    Ok(HttpResponse::Ok().json(request))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave/requests",
    params(LeaveQuery),
    responses(
        (status = 200, description = "Paginated leave list, newest first", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LeaveQuery>,
) -> AppResult<HttpResponse> {
    let employee_id = if auth.can(Capability::ViewAllRecords) {
        query.employee_id
    } else {
        match query.employee_id {
            Some(id) if id != auth.user_id => {
                return Err(AppError::Forbidden(
                    "Employees can only list their own leave requests".to_string(),
                ));
            }
            _ => Some(auth.user_id),
        }
    };

    let page = Page::new(query.page, query.per_page);
    let (data, total) = leave::list_requests(&state, employee_id, query.status, page).await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/leave/balance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose balance to read")
    ),
    responses(
        (status = 200, description = "Remaining balance with this year's approved leave", body = BalanceReport),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_balance(
    auth: AuthUser,
    state: web::Data<AppState>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_self_or(employee_id, Capability::ViewAllRecords)?;

    let report = leave::balance_report(&state, config.leave_seed, employee_id).await?;
    Ok(HttpResponse::Ok().json(report))
}

#[utoipa::path(
    put,
    path = "/api/leave/balance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose ledger to adjust")
    ),
    request_body = AdjustBalanceReq,
    responses(
        (status = 200, description = "Ledger after the adjustment", body = LeaveBalance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found"),
        (status = 422, description = "No amounts given, or a counter would go negative")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn adjust_balance(
    auth: AuthUser,
    state: web::Data<AppState>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<AdjustBalanceReq>,
) -> AppResult<HttpResponse> {
    auth.require(Capability::AdjustBalances)?;

    let req = payload.into_inner();
    let ledger = leave::adjust_balance(
        &state,
        config.leave_seed,
        path.into_inner(),
        BalanceAdjustment {
            mode: req.mode,
            annual: req.annual,
            sick: req.sick,
            casual: req.casual,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(ledger))
}
