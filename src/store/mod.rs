//! Storage seam.
//!
//! Services talk to an [`HrStore`] trait object. Every method that changes
//! more than one row runs as a single unit: the MySQL backend wraps it in a
//! transaction, the memory backend holds its lock for the whole call.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::{
    asset::{Asset, AssetPatch, NewAsset},
    attendance::{Attendance, AttendanceFilter, NewAttendance},
    leave::{
        BalanceAdjustment, DecisionRules, LeaveBalance, LeaveDecision, LeaveFilter, LeaveRequest,
        LeaveSeed, NewLeaveRequest,
    },
    notification::{NewNotification, Notification},
    policy::{NewPolicy, Policy, PolicyPatch},
    role::Role,
    user::{Credentials, NewUser, User, UserFilter, UserPatch},
};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Result of an approve/reject, all three parts committed together.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub request: LeaveRequest,
    /// Present for approvals only.
    pub balance: Option<LeaveBalance>,
    pub notification: Notification,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts the user and its seeded ledger row together.
    async fn insert_user(&self, user: NewUser, seed: LeaveSeed) -> StoreResult<User>;
    async fn find_user(&self, id: u64) -> StoreResult<Option<User>>;
    async fn find_credentials(&self, email: &str) -> StoreResult<Option<Credentials>>;
    async fn list_users(&self, filter: &UserFilter) -> StoreResult<(Vec<User>, i64)>;
    async fn users_with_role(&self, role: Role) -> StoreResult<Vec<User>>;
    async fn count_users(&self) -> StoreResult<i64>;
    async fn user_emails(&self) -> StoreResult<Vec<String>>;
    async fn update_user(&self, id: u64, patch: &UserPatch) -> StoreResult<Option<User>>;
    /// Removes the user and every row that belongs to them.
    async fn delete_user(&self, id: u64) -> StoreResult<bool>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn leave_balance(&self, employee_id: u64) -> StoreResult<Option<LeaveBalance>>;
    /// Returns the ledger row, creating it from `seed` when absent.
    async fn ensure_leave_balance(&self, employee_id: u64, seed: LeaveSeed)
    -> StoreResult<LeaveBalance>;
    async fn adjust_leave_balance(
        &self,
        employee_id: u64,
        adjustment: &BalanceAdjustment,
        seed: LeaveSeed,
    ) -> StoreResult<LeaveBalance>;
    async fn insert_leave_request(&self, request: NewLeaveRequest) -> StoreResult<LeaveRequest>;
    async fn find_leave_request(&self, id: u64) -> StoreResult<Option<LeaveRequest>>;
    async fn list_leave_requests(&self, filter: &LeaveFilter)
    -> StoreResult<(Vec<LeaveRequest>, i64)>;
    /// Approved requests of one employee that lie entirely inside `[from, to]`.
    async fn approved_leave_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<LeaveRequest>>;
    /// Applies a decision to a pending request, re-checking the status in the
    /// same unit of work as the ledger change and the employee notification.
    async fn decide_leave_request(
        &self,
        id: u64,
        decision: LeaveDecision,
        decided_by: u64,
        rules: DecisionRules,
    ) -> StoreResult<DecisionOutcome>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: NewNotification)
    -> StoreResult<Notification>;
    async fn notifications_for(&self, user_id: u64) -> StoreResult<Vec<Notification>>;
    async fn unread_count(&self, user_id: u64) -> StoreResult<i64>;
    async fn mark_notification_read(&self, user_id: u64, id: u64) -> StoreResult<bool>;
    async fn mark_all_notifications_read(&self, user_id: u64) -> StoreResult<u64>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Conflict when the employee already has a record for that date.
    async fn insert_attendance(&self, record: NewAttendance) -> StoreResult<Attendance>;
    async fn attendance_on(&self, employee_id: u64, date: NaiveDate)
    -> StoreResult<Option<Attendance>>;
    /// Sets the check-out only if none is recorded yet; `None` otherwise.
    async fn record_check_out(
        &self,
        id: u64,
        check_out: chrono::NaiveTime,
        early_exit: bool,
    ) -> StoreResult<Option<Attendance>>;
    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>>;
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn insert_asset(&self, asset: NewAsset) -> StoreResult<Asset>;
    async fn find_asset(&self, id: u64) -> StoreResult<Option<Asset>>;
    async fn list_assets(&self, assigned_to: Option<u64>) -> StoreResult<Vec<Asset>>;
    async fn update_asset(&self, id: u64, patch: &AssetPatch) -> StoreResult<Option<Asset>>;
    async fn delete_asset(&self, id: u64) -> StoreResult<bool>;
}

#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn insert_policy(&self, policy: NewPolicy) -> StoreResult<Policy>;
    async fn find_policy(&self, id: u64) -> StoreResult<Option<Policy>>;
    async fn list_policies(&self, skip: u64, limit: u64) -> StoreResult<Vec<Policy>>;
    async fn update_policy(&self, id: u64, patch: &PolicyPatch) -> StoreResult<Option<Policy>>;
    async fn delete_policy(&self, id: u64) -> StoreResult<bool>;
}

pub trait HrStore:
    UserStore + LeaveStore + NotificationStore + AttendanceStore + AssetStore + PolicyStore
{
}

impl<T> HrStore for T where
    T: UserStore + LeaveStore + NotificationStore + AttendanceStore + AssetStore + PolicyStore
{
}
