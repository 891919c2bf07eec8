//! Leave workflow: filing, deciding, and reading the ledger.

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::{
    leave::{
        AdjustMode, BalanceAdjustment, DecisionRules, LeaveBalance, LeaveDecision, LeaveFilter,
        LeaveRequest, LeaveSeed, LeaveStatus, LeaveType, NewLeaveRequest, day_span,
    },
    notification::NewNotification,
    role::Role,
};
use crate::service::Page;
use crate::state::AppState;
use crate::store::{DecisionOutcome, StoreError};

#[derive(Debug, Clone)]
pub struct CreateLeave {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

/// Live ledger plus this year's approved leave for cross-checking.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "employee_id": 42,
    "annual_leave": 10.0,
    "sick_leave": 2.0,
    "casual_leave": 5.0,
    "total_remaining": 17.0,
    "year": 2024,
    "approved_requests_this_year": 1,
    "days_taken_this_year": 3,
    "days_deducted_this_year": 3.0
}))]
/// The yearly figures only count approved requests that lie entirely within
/// the current calendar year; a request spanning Dec 31 is counted in neither.
pub struct BalanceReport {
    pub employee_id: u64,
    pub annual_leave: f64,
    pub sick_leave: f64,
    pub casual_leave: f64,
    pub total_remaining: f64,
    pub year: i32,
    pub approved_requests_this_year: usize,
    /// Calendar days covered by approved requests.
    pub days_taken_this_year: i64,
    /// Days actually charged to the ledger for those requests.
    pub days_deducted_this_year: f64,
}

/// Files a pending request and tells every HR user about it.
#[instrument(
    skip(state, seed, input),
    fields(employee_id = input.employee_id, leave_type = %input.leave_type)
)]
pub async fn create_request(
    state: &AppState,
    seed: LeaveSeed,
    input: CreateLeave,
) -> AppResult<LeaveRequest> {
    if input.start_date > input.end_date {
        return Err(AppError::validation("start_date cannot be after end_date"));
    }
    if input.start_date < state.clock.today() {
        return Err(AppError::validation("start_date cannot be in the past"));
    }

    let employee = state
        .store
        .find_user(input.employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    let ledger = state.store.ensure_leave_balance(employee.id, seed).await?;
    let days = day_span(input.start_date, input.end_date) as f64;
    if ledger.total() < days {
        info!(
            available = ledger.total(),
            requested = days,
            "Leave request refused: insufficient balance"
        );
        return Err(AppError::Conflict(format!(
            "Insufficient leave balance: {} day(s) available, {} requested",
            ledger.total(),
            days
        )));
    }

    let request = state
        .store
        .insert_leave_request(NewLeaveRequest {
            employee_id: employee.id,
            leave_type: input.leave_type,
            start_date: input.start_date,
            end_date: input.end_date,
            reason: input.reason.trim().to_string(),
        })
        .await?;
    info!(request_id = request.id, days, "Leave request submitted");

    notify_hr(state, &request, &employee.full_name).await;
    Ok(request)
}

/// Best-effort fan-out; failures are logged and never undo the request.
async fn notify_hr(state: &AppState, request: &LeaveRequest, requester: &str) -> usize {
    let hr_users = match state.store.users_with_role(Role::Hr).await {
        Ok(users) => users,
        Err(e) => {
            warn!(error = %e, request_id = request.id, "Could not load HR users to notify");
            return 0;
        }
    };

    let message = request.new_request_message(requester);
    let mut delivered = 0;
    for hr in hr_users {
        let sent = state
            .store
            .insert_notification(NewNotification {
                user_id: hr.id,
                message: message.clone(),
            })
            .await;
        match sent {
            Ok(_) => delivered += 1,
            Err(e) => {
                warn!(
                    error = %e,
                    request_id = request.id,
                    hr_id = hr.id,
                    "Failed to notify HR user"
                )
            }
        }
    }
    delivered
}

/// Approves or rejects a pending request. The status change, the ledger
/// deduction and the employee notification commit together.
#[instrument(skip(state, rules))]
pub async fn decide(
    state: &AppState,
    rules: DecisionRules,
    decided_by: u64,
    id: u64,
    decision: LeaveDecision,
) -> AppResult<DecisionOutcome> {
    let outcome = state
        .store
        .decide_leave_request(id, decision, decided_by, rules)
        .await
        .map_err(|e| {
            if matches!(e, StoreError::Database(_) | StoreError::Unavailable(_)) {
                error!(error = %e, request_id = id, "Leave decision rolled back");
            }
            AppError::from(e)
        })?;

    info!(
        request_id = id,
        status = %outcome.request.status,
        days_deducted = outcome.request.days_deducted,
        "Leave request decided"
    );
    Ok(outcome)
}

pub async fn get_request(state: &AppState, id: u64) -> AppResult<LeaveRequest> {
    state
        .store
        .find_leave_request(id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave request not found"))
}

pub async fn list_requests(
    state: &AppState,
    employee_id: Option<u64>,
    status: Option<LeaveStatus>,
    page: Page,
) -> AppResult<(Vec<LeaveRequest>, i64)> {
    let filter = LeaveFilter {
        employee_id,
        status,
        page: page.page,
        per_page: page.per_page,
    };
    Ok(state.store.list_leave_requests(&filter).await?)
}

/// Reads the ledger without creating it; a missing row reports the seed.
pub async fn balance_report(
    state: &AppState,
    seed: LeaveSeed,
    employee_id: u64,
) -> AppResult<BalanceReport> {
    if state.store.find_user(employee_id).await?.is_none() {
        return Err(AppError::not_found("Employee not found"));
    }

    let ledger = state
        .store
        .leave_balance(employee_id)
        .await?
        .unwrap_or_else(|| LeaveBalance::seeded(employee_id, seed, Utc::now()));

    let year = state.clock.today().year();
    let (from, to) = match (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) {
        (Some(from), Some(to)) => (from, to),
        _ => return Err(AppError::Internal(format!("calendar year {year} out of range"))),
    };
    let approved = state
        .store
        .approved_leave_between(employee_id, from, to)
        .await?;

    Ok(BalanceReport {
        employee_id,
        annual_leave: ledger.annual_leave,
        sick_leave: ledger.sick_leave,
        casual_leave: ledger.casual_leave,
        total_remaining: ledger.total(),
        year,
        approved_requests_this_year: approved.len(),
        days_taken_this_year: approved.iter().map(LeaveRequest::day_span).sum(),
        days_deducted_this_year: approved.iter().map(|r| r.days_deducted).sum(),
    })
}

/// HR top-up or correction of the ledger.
#[instrument(skip(state, seed))]
pub async fn adjust_balance(
    state: &AppState,
    seed: LeaveSeed,
    employee_id: u64,
    adjustment: BalanceAdjustment,
) -> AppResult<LeaveBalance> {
    let amounts = [adjustment.annual, adjustment.sick, adjustment.casual];
    if amounts.iter().all(Option::is_none) {
        return Err(AppError::validation("No leave counters provided"));
    }
    if amounts.iter().flatten().any(|a| !a.is_finite()) {
        return Err(AppError::validation("Leave amounts must be finite numbers"));
    }
    if adjustment.mode == AdjustMode::Set && amounts.iter().flatten().any(|a| *a < 0.0) {
        return Err(AppError::validation("Leave counters cannot be set below zero"));
    }

    let ledger = state
        .store
        .adjust_leave_balance(employee_id, &adjustment, seed)
        .await?;
    info!(
        employee_id,
        annual = ledger.annual_leave,
        sick = ledger.sick_leave,
        casual = ledger.casual_leave,
        "Leave balance adjusted"
    );
    Ok(ledger)
}
