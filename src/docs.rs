use crate::api::assets::{CreateAssetReq, MaintenanceReq, UpdateAssetReq};
use crate::api::attendance::PunchReq;
use crate::api::leave_request::{
    AdjustBalanceReq, CreateLeaveReq, DecisionResponse, LeaveListResponse, LeaveQuery,
};
use crate::api::notifications::{MarkedRead, UnreadCount};
use crate::api::policies::{CreatePolicyReq, UpdatePolicyReq};
use crate::api::users::{CreateUserReq, UpdateUserReq, UserListResponse};
use crate::model::{
    asset::Asset,
    attendance::Attendance,
    leave::{AdjustMode, LeaveBalance, LeaveRequest, LeaveStatus, LeaveType},
    notification::Notification,
    policy::Policy,
    role::Role,
    user::User,
};
use crate::models::{LoginReqDto, MessageResponse, RegisterReq, TokenResponse};
use crate::service::attendance::{AttendanceSummary, DailyHours};
use crate::service::leave::BalanceReport;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRMS API",
        version = "1.0.0",
        description = r#"
## Human Resource Management System

Backend for day-to-day HR operations, built around the leave workflow.

### Key Features
- **Leave Management**
  - File leave, approve/reject requests (HR), and read or adjust the leave ledger
  - Approvals deduct the ledger and notify the employee in one transaction
- **Attendance**
  - Daily check-in and check-out with late-arrival and early-exit flags
- **Users**, **Notifications**, **Assets** and **Policies**

### Security
Protected endpoints expect a **JWT Bearer** token from `/auth/login`.
HR-only operations answer `403` for employees.

### Response Format
- JSON bodies; errors look like `{"error": "<code>", "message": "<text>"}`
- Pagination (`page`, `per_page`) on list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::register,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_balance,
        crate::api::leave_request::adjust_balance,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today,
        crate::api::attendance::records,
        crate::api::attendance::summary,

        crate::api::users::create_user,
        crate::api::users::list_users,
        crate::api::users::me,
        crate::api::users::get_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,

        crate::api::notifications::list,
        crate::api::notifications::unread_count,
        crate::api::notifications::mark_read,
        crate::api::notifications::mark_all_read,

        crate::api::assets::create_asset,
        crate::api::assets::list_assets,
        crate::api::assets::user_assets,
        crate::api::assets::get_asset,
        crate::api::assets::update_asset,
        crate::api::assets::delete_asset,
        crate::api::assets::schedule_maintenance,

        crate::api::policies::create_policy,
        crate::api::policies::list_policies,
        crate::api::policies::get_policy,
        crate::api::policies::update_policy,
        crate::api::policies::delete_policy
    ),
    components(
        schemas(
            LoginReqDto,
            RegisterReq,
            TokenResponse,
            MessageResponse,
            Role,
            User,
            CreateUserReq,
            UpdateUserReq,
            UserListResponse,
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            LeaveBalance,
            AdjustMode,
            CreateLeaveReq,
            LeaveQuery,
            LeaveListResponse,
            DecisionResponse,
            AdjustBalanceReq,
            BalanceReport,
            Attendance,
            PunchReq,
            AttendanceSummary,
            DailyHours,
            Notification,
            UnreadCount,
            MarkedRead,
            Asset,
            CreateAssetReq,
            UpdateAssetReq,
            MaintenanceReq,
            Policy,
            CreatePolicyReq,
            UpdatePolicyReq
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and self-service registration"),
        (name = "Leave", description = "Leave requests, approvals and the leave ledger"),
        (name = "Attendance", description = "Daily check-in/check-out"),
        (name = "Users", description = "User management"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Assets", description = "Company asset tracking"),
        (name = "Policies", description = "HR policy documents"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_leave_paths_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/leave/request/{leave_id}/approve"));
        assert!(doc.paths.paths.contains_key("/auth/login"));
        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
    }
}
