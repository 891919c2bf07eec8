//! MySQL backend.
//!
//! Queries are built at runtime and decoded into private row structs, which
//! are then converted into the domain types. Multi-row changes run inside a
//! transaction; returning early drops it and rolls everything back.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, MySqlPool};

use super::{
    AssetStore, AttendanceStore, DecisionOutcome, LeaveStore, NotificationStore, PolicyStore,
    StoreError, StoreResult, UserStore,
};
use crate::model::{
    asset::{Asset, AssetPatch, NewAsset},
    attendance::{Attendance, AttendanceFilter, NewAttendance, STATUS_PRESENT},
    leave::{
        BalanceAdjustment, DecisionRules, LeaveBalance, LeaveDecision, LeaveFilter, LeaveRequest,
        LeaveSeed, LeaveStatus, LeaveType, NewLeaveRequest,
    },
    notification::{NewNotification, Notification},
    policy::{NewPolicy, Policy, PolicyPatch},
    role::Role,
    user::{Credentials, NewUser, User, UserFilter, UserPatch},
};
use crate::utils::db_utils::SqlUpdate;

const USER_COLUMNS: &str = "id, email, password_hash, full_name, role, employee_code, phone, \
     department, position, hire_date, is_active, created_at, updated_at";
const BALANCE_COLUMNS: &str = "employee_id, annual_leave, sick_leave, casual_leave, updated_at";
const LEAVE_COLUMNS: &str = "id, employee_id, leave_type, start_date, end_date, reason, status, \
     days_deducted, decided_by, created_at, updated_at";
const NOTIFICATION_COLUMNS: &str = "id, user_id, message, is_read, created_at";
const ATTENDANCE_COLUMNS: &str = "id, employee_id, date, check_in, check_out, status, late_entry, \
     early_exit, created_at, updated_at";
const ASSET_COLUMNS: &str = "id, asset_name, category, department, `condition`, assigned_to, \
     purchase_date, warranty_expiry, maintenance_schedule, notes, created_at, updated_at";
const POLICY_COLUMNS: &str = "id, title, description, content, category, effective_date, \
     expiry_date, created_by, created_at, updated_at";

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
    Date(NaiveDate),
}

fn parse_column<T>(raw: &str, column: &str) -> StoreResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().map_err(|e: T::Err| {
        StoreError::Database(sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
    })
}

/// Row offset of a 1-based page; huge page numbers saturate instead of wrapping.
fn page_offset(page: u64, per_page: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(per_page)
}

/// Maps constraint violations to domain errors, everything else stays a database error.
fn constraint_error(e: sqlx::Error, duplicate: &str, missing: &str) -> StoreError {
    let (is_unique, is_foreign) = match &e {
        sqlx::Error::Database(db) => (db.is_unique_violation(), db.is_foreign_key_violation()),
        _ => (false, false),
    };
    if is_unique {
        StoreError::Conflict(duplicate.to_string())
    } else if is_foreign {
        StoreError::NotFound(missing.to_string())
    } else {
        StoreError::Database(e)
    }
}

#[derive(FromRow)]
struct UserRow {
    id: u64,
    email: String,
    password_hash: String,
    full_name: String,
    role: String,
    employee_code: Option<String>,
    phone: Option<String>,
    department: Option<String>,
    position: Option<String>,
    hire_date: Option<NaiveDate>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for Credentials {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(Credentials {
            user: User {
                id: row.id,
                email: row.email,
                full_name: row.full_name,
                role: parse_column(&row.role, "role")?,
                employee_code: row.employee_code,
                phone: row.phone,
                department: row.department,
                position: row.position,
                hire_date: row.hire_date,
                is_active: row.is_active,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            password_hash: row.password_hash,
        })
    }
}

fn into_user(row: UserRow) -> StoreResult<User> {
    Credentials::try_from(row).map(|c| c.user)
}

#[derive(FromRow)]
struct BalanceRow {
    employee_id: u64,
    annual_leave: f64,
    sick_leave: f64,
    casual_leave: f64,
    updated_at: DateTime<Utc>,
}

impl From<BalanceRow> for LeaveBalance {
    fn from(row: BalanceRow) -> Self {
        LeaveBalance {
            employee_id: row.employee_id,
            annual_leave: row.annual_leave,
            sick_leave: row.sick_leave,
            casual_leave: row.casual_leave,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
    status: String,
    days_deducted: f64,
    decided_by: Option<u64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> StoreResult<Self> {
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: LeaveType::from_stored(&row.leave_type),
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            status: parse_column(&row.status, "status")?,
            days_deducted: row.days_deducted,
            decided_by: row.decided_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct NotificationRow {
    id: u64,
    user_id: u64,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            user_id: row.user_id,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    check_in: NaiveTime,
    check_out: Option<NaiveTime>,
    status: String,
    late_entry: bool,
    early_exit: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AttendanceRow> for Attendance {
    fn from(row: AttendanceRow) -> Self {
        Attendance {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            check_in: row.check_in,
            check_out: row.check_out,
            status: row.status,
            late_entry: row.late_entry,
            early_exit: row.early_exit,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct AssetRow {
    id: u64,
    asset_name: String,
    category: String,
    department: Option<String>,
    condition: String,
    assigned_to: Option<u64>,
    purchase_date: Option<NaiveDate>,
    warranty_expiry: Option<NaiveDate>,
    maintenance_schedule: Option<NaiveDate>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AssetRow> for Asset {
    fn from(row: AssetRow) -> Self {
        Asset {
            id: row.id,
            asset_name: row.asset_name,
            category: row.category,
            department: row.department,
            condition: row.condition,
            assigned_to: row.assigned_to,
            purchase_date: row.purchase_date,
            warranty_expiry: row.warranty_expiry,
            maintenance_schedule: row.maintenance_schedule,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct PolicyRow {
    id: u64,
    title: String,
    description: String,
    content: String,
    category: String,
    effective_date: NaiveDate,
    expiry_date: Option<NaiveDate>,
    created_by: Option<u64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PolicyRow> for Policy {
    fn from(row: PolicyRow) -> Self {
        Policy {
            id: row.id,
            title: row.title,
            description: row.description,
            content: row.content,
            category: row.category,
            effective_date: row.effective_date,
            expiry_date: row.expiry_date,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn insert_user(&self, user: NewUser, seed: LeaveSeed) -> StoreResult<User> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO users
                (email, password_hash, full_name, role, employee_code, phone, department, position, hire_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.full_name)
        .bind(user.role.as_str())
        .bind(user.employee_code)
        .bind(user.phone)
        .bind(user.department)
        .bind(user.position)
        .bind(user.hire_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| constraint_error(e, "Email or employee code already registered", "User not found"))?;
        let id = result.last_insert_id();

        sqlx::query(
            "INSERT INTO leave_balance (employee_id, annual_leave, sick_leave, casual_leave) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(seed.annual)
        .bind(seed.sick)
        .bind(seed.casual)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        into_user(row)
    }

    async fn find_user(&self, id: u64) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(into_user)
            .transpose()
    }

    async fn find_credentials(&self, email: &str) -> StoreResult<Option<Credentials>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(Credentials::try_from)
            .transpose()
    }

    async fn list_users(&self, filter: &UserFilter) -> StoreResult<(Vec<User>, i64)> {
        let where_sql = if filter.role.is_some() { " WHERE role = ?" } else { "" };
        let role = filter.role.map(|r| r.as_str());
        let offset = page_offset(filter.page, filter.per_page);

        let count_sql = format!("SELECT COUNT(*) FROM users{}", where_sql);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(role) = role {
            count_q = count_q.bind(role);
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {USER_COLUMNS} FROM users{} ORDER BY id LIMIT ? OFFSET ?",
            where_sql
        );
        let mut data_q = sqlx::query_as::<_, UserRow>(&data_sql);
        if let Some(role) = role {
            data_q = data_q.bind(role);
        }
        let users = data_q
            .bind(filter.per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(into_user)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok((users, total))
    }

    async fn users_with_role(&self, role: Role) -> StoreResult<Vec<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = ? ORDER BY id"
        ))
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(into_user)
        .collect()
    }

    async fn count_users(&self) -> StoreResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn user_emails(&self) -> StoreResult<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>("SELECT email FROM users")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_user(&self, id: u64, patch: &UserPatch) -> StoreResult<Option<User>> {
        let mut update = SqlUpdate::new();
        update
            .set_some("email", patch.email.clone())
            .set_some("password_hash", patch.password_hash.clone())
            .set_some("full_name", patch.full_name.clone())
            .set_some("role", patch.role.map(|r| r.as_str()))
            .set_some("employee_code", patch.employee_code.clone())
            .set_some("phone", patch.phone.clone())
            .set_some("department", patch.department.clone())
            .set_some("position", patch.position.clone())
            .set_some("hire_date", patch.hire_date)
            .set_some("is_active", patch.is_active);

        if !update.is_empty() {
            update
                .execute(&self.pool, "users", "id", id)
                .await
                .map_err(|e| {
                    constraint_error(e, "Email or employee code already registered", "User not found")
                })?;
        }
        self.find_user(id).await
    }

    async fn delete_user(&self, id: u64) -> StoreResult<bool> {
        // leave, attendance and notification rows cascade; assets and policies are detached
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn leave_balance(&self, employee_id: u64) -> StoreResult<Option<LeaveBalance>> {
        Ok(sqlx::query_as::<_, BalanceRow>(&format!(
            "SELECT {BALANCE_COLUMNS} FROM leave_balance WHERE employee_id = ?"
        ))
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?
        .map(LeaveBalance::from))
    }

    async fn ensure_leave_balance(
        &self,
        employee_id: u64,
        seed: LeaveSeed,
    ) -> StoreResult<LeaveBalance> {
        // INSERT IGNORE also swallows the foreign key failure for unknown users,
        // which then surfaces as a missing row below.
        sqlx::query(
            "INSERT IGNORE INTO leave_balance (employee_id, annual_leave, sick_leave, casual_leave) VALUES (?, ?, ?, ?)",
        )
        .bind(employee_id)
        .bind(seed.annual)
        .bind(seed.sick)
        .bind(seed.casual)
        .execute(&self.pool)
        .await?;

        self.leave_balance(employee_id)
            .await?
            .ok_or_else(|| StoreError::NotFound("User not found".to_string()))
    }

    async fn adjust_leave_balance(
        &self,
        employee_id: u64,
        adjustment: &BalanceAdjustment,
        seed: LeaveSeed,
    ) -> StoreResult<LeaveBalance> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT IGNORE INTO leave_balance (employee_id, annual_leave, sick_leave, casual_leave) VALUES (?, ?, ?, ?)",
        )
        .bind(employee_id)
        .bind(seed.annual)
        .bind(seed.sick)
        .bind(seed.casual)
        .execute(&mut *tx)
        .await?;

        let mut ledger: LeaveBalance = sqlx::query_as::<_, BalanceRow>(&format!(
            "SELECT {BALANCE_COLUMNS} FROM leave_balance WHERE employee_id = ? FOR UPDATE"
        ))
        .bind(employee_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound("User not found".to_string()))?
        .into();

        ledger
            .adjust(adjustment, Utc::now())
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        sqlx::query(
            "UPDATE leave_balance SET annual_leave = ?, sick_leave = ?, casual_leave = ? WHERE employee_id = ?",
        )
        .bind(ledger.annual_leave)
        .bind(ledger.sick_leave)
        .bind(ledger.casual_leave)
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ledger)
    }

    async fn insert_leave_request(&self, request: NewLeaveRequest) -> StoreResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, reason, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(request.leave_type.as_str())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.reason)
        .bind(LeaveStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| constraint_error(e, "Leave request already exists", "User not found"))?;

        self.find_leave_request(result.last_insert_id())
            .await?
            .ok_or_else(|| StoreError::NotFound("Leave request not found".to_string()))
    }

    async fn find_leave_request(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        sqlx::query_as::<_, LeaveRow>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(LeaveRequest::try_from)
        .transpose()
    }

    async fn list_leave_requests(
        &self,
        filter: &LeaveFilter,
    ) -> StoreResult<(Vec<LeaveRequest>, i64)> {
        let offset = page_offset(filter.page, filter.per_page);

        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(emp_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(emp_id));
        }

        if let Some(status) = filter.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.as_str()));
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
                FilterValue::Date(d) => count_q.bind(*d),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            where_sql
        );
        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
                FilterValue::Date(d) => data_q.bind(d),
            };
        }

        let requests = data_q
            .bind(filter.per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok((requests, total))
    }

    async fn approved_leave_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<LeaveRequest>> {
        sqlx::query_as::<_, LeaveRow>(&format!(
            r#"
            SELECT {LEAVE_COLUMNS} FROM leave_requests
            WHERE employee_id = ? AND status = ? AND start_date >= ? AND end_date <= ?
            ORDER BY start_date
            "#
        ))
        .bind(employee_id)
        .bind(LeaveStatus::Approved.as_str())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(LeaveRequest::try_from)
        .collect()
    }

    async fn decide_leave_request(
        &self,
        id: u64,
        decision: LeaveDecision,
        decided_by: u64,
        rules: DecisionRules,
    ) -> StoreResult<DecisionOutcome> {
        let mut tx = self.pool.begin().await?;

        let mut request: LeaveRequest = sqlx::query_as::<_, LeaveRow>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ? FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound("Leave request not found".to_string()))?
        .try_into()?;
        let now = Utc::now();

        let balance = match decision {
            LeaveDecision::Approve => {
                sqlx::query(
                    "INSERT IGNORE INTO leave_balance (employee_id, annual_leave, sick_leave, casual_leave) VALUES (?, ?, ?, ?)",
                )
                .bind(request.employee_id)
                .bind(rules.seed.annual)
                .bind(rules.seed.sick)
                .bind(rules.seed.casual)
                .execute(&mut *tx)
                .await?;

                let mut ledger: LeaveBalance = sqlx::query_as::<_, BalanceRow>(&format!(
                    "SELECT {BALANCE_COLUMNS} FROM leave_balance WHERE employee_id = ? FOR UPDATE"
                ))
                .bind(request.employee_id)
                .fetch_one(&mut *tx)
                .await?
                .into();

                request
                    .approve(decided_by, &mut ledger, rules.shortfall, now)
                    .map_err(|e| StoreError::Conflict(e.to_string()))?;

                sqlx::query(
                    "UPDATE leave_balance SET annual_leave = ?, sick_leave = ?, casual_leave = ? WHERE employee_id = ?",
                )
                .bind(ledger.annual_leave)
                .bind(ledger.sick_leave)
                .bind(ledger.casual_leave)
                .bind(ledger.employee_id)
                .execute(&mut *tx)
                .await?;
                Some(ledger)
            }
            LeaveDecision::Reject => {
                request
                    .reject(decided_by, now)
                    .map_err(|e| StoreError::Conflict(e.to_string()))?;
                None
            }
        };

        // compare-and-swap on the status guards against a decision racing past the row lock
        let updated = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, days_deducted = ?, decided_by = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(request.status.as_str())
        .bind(request.days_deducted)
        .bind(decided_by)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "leave request {id} is no longer pending"
            )));
        }

        let notification_id = sqlx::query("INSERT INTO notifications (user_id, message) VALUES (?, ?)")
            .bind(request.employee_id)
            .bind(request.decision_message())
            .execute(&mut *tx)
            .await?
            .last_insert_id();

        let notification: Notification = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?"
        ))
        .bind(notification_id)
        .fetch_one(&mut *tx)
        .await?
        .into();

        tx.commit().await?;

        Ok(DecisionOutcome {
            request,
            balance,
            notification,
        })
    }
}

#[async_trait]
impl NotificationStore for MySqlStore {
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> StoreResult<Notification> {
        let id = sqlx::query("INSERT INTO notifications (user_id, message) VALUES (?, ?)")
            .bind(notification.user_id)
            .bind(notification.message)
            .execute(&self.pool)
            .await
            .map_err(|e| constraint_error(e, "Notification already exists", "User not found"))?
            .last_insert_id();

        Ok(sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?
        .into())
    }

    async fn notifications_for(&self, user_id: u64) -> StoreResult<Vec<Notification>> {
        Ok(sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Notification::from)
        .collect())
    }

    async fn unread_count(&self, user_id: u64) -> StoreResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn mark_notification_read(&self, user_id: u64, id: u64) -> StoreResult<bool> {
        let owned = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        if owned == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    async fn mark_all_notifications_read(&self, user_id: u64) -> StoreResult<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn insert_attendance(&self, record: NewAttendance) -> StoreResult<Attendance> {
        let id = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, check_in, status, late_entry)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(record.date)
        .bind(record.check_in)
        .bind(STATUS_PRESENT)
        .bind(record.late_entry)
        .execute(&self.pool)
        .await
        .map_err(|e| constraint_error(e, "Already checked in today", "User not found"))?
        .last_insert_id();

        Ok(sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?
        .into())
    }

    async fn attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<Attendance>> {
        Ok(sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
        ))
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?
        .map(Attendance::from))
    }

    async fn record_check_out(
        &self,
        id: u64,
        check_out: NaiveTime,
        early_exit: bool,
    ) -> StoreResult<Option<Attendance>> {
        let result = sqlx::query(
            "UPDATE attendance SET check_out = ?, early_exit = ? WHERE id = ? AND check_out IS NULL",
        )
        .bind(check_out)
        .bind(early_exit)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Attendance::from))
    }

    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(emp_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(emp_id));
        }
        if let Some(from) = filter.from {
            where_sql.push_str(" AND date >= ?");
            args.push(FilterValue::Date(from));
        }
        if let Some(to) = filter.to {
            where_sql.push_str(" AND date <= ?");
            args.push(FilterValue::Date(to));
        }

        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance{} ORDER BY date DESC, id DESC",
            where_sql
        );
        let mut query = sqlx::query_as::<_, AttendanceRow>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Str(s) => query.bind(s),
                FilterValue::Date(d) => query.bind(d),
            };
        }

        Ok(query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Attendance::from)
            .collect())
    }
}

#[async_trait]
impl AssetStore for MySqlStore {
    async fn insert_asset(&self, asset: NewAsset) -> StoreResult<Asset> {
        let id = sqlx::query(
            r#"
            INSERT INTO assets
                (asset_name, category, department, `condition`, assigned_to,
                 purchase_date, warranty_expiry, maintenance_schedule, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(asset.asset_name)
        .bind(asset.category)
        .bind(asset.department)
        .bind(asset.condition)
        .bind(asset.assigned_to)
        .bind(asset.purchase_date)
        .bind(asset.warranty_expiry)
        .bind(asset.maintenance_schedule)
        .bind(asset.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| constraint_error(e, "Asset already exists", "Assigned user not found"))?
        .last_insert_id();

        self.find_asset(id)
            .await?
            .ok_or_else(|| StoreError::NotFound("Asset not found".to_string()))
    }

    async fn find_asset(&self, id: u64) -> StoreResult<Option<Asset>> {
        Ok(sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Asset::from))
    }

    async fn list_assets(&self, assigned_to: Option<u64>) -> StoreResult<Vec<Asset>> {
        let where_sql = if assigned_to.is_some() { " WHERE assigned_to = ?" } else { "" };
        let sql = format!("SELECT {ASSET_COLUMNS} FROM assets{} ORDER BY id", where_sql);
        let mut query = sqlx::query_as::<_, AssetRow>(&sql);
        if let Some(user_id) = assigned_to {
            query = query.bind(user_id);
        }

        Ok(query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Asset::from)
            .collect())
    }

    async fn update_asset(&self, id: u64, patch: &AssetPatch) -> StoreResult<Option<Asset>> {
        let mut update = SqlUpdate::new();
        update
            .set_some("asset_name", patch.asset_name.clone())
            .set_some("category", patch.category.clone())
            .set_some("department", patch.department.clone())
            .set_some("condition", patch.condition.clone())
            .set_some("assigned_to", patch.assigned_to)
            .set_some("purchase_date", patch.purchase_date)
            .set_some("warranty_expiry", patch.warranty_expiry)
            .set_some("maintenance_schedule", patch.maintenance_schedule)
            .set_some("notes", patch.notes.clone());

        if !update.is_empty() {
            update
                .execute(&self.pool, "assets", "id", id)
                .await
                .map_err(|e| constraint_error(e, "Asset already exists", "Assigned user not found"))?;
        }
        self.find_asset(id).await
    }

    async fn delete_asset(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM assets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PolicyStore for MySqlStore {
    async fn insert_policy(&self, policy: NewPolicy) -> StoreResult<Policy> {
        let id = sqlx::query(
            r#"
            INSERT INTO policies
                (title, description, content, category, effective_date, expiry_date, created_by)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(policy.title)
        .bind(policy.description)
        .bind(policy.content)
        .bind(policy.category)
        .bind(policy.effective_date)
        .bind(policy.expiry_date)
        .bind(policy.created_by)
        .execute(&self.pool)
        .await
        .map_err(|e| constraint_error(e, "Policy already exists", "User not found"))?
        .last_insert_id();

        self.find_policy(id)
            .await?
            .ok_or_else(|| StoreError::NotFound("Policy not found".to_string()))
    }

    async fn find_policy(&self, id: u64) -> StoreResult<Option<Policy>> {
        Ok(sqlx::query_as::<_, PolicyRow>(&format!(
            "SELECT {POLICY_COLUMNS} FROM policies WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Policy::from))
    }

    async fn list_policies(&self, skip: u64, limit: u64) -> StoreResult<Vec<Policy>> {
        Ok(sqlx::query_as::<_, PolicyRow>(&format!(
            "SELECT {POLICY_COLUMNS} FROM policies ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Policy::from)
        .collect())
    }

    async fn update_policy(&self, id: u64, patch: &PolicyPatch) -> StoreResult<Option<Policy>> {
        let mut update = SqlUpdate::new();
        update
            .set_some("title", patch.title.clone())
            .set_some("description", patch.description.clone())
            .set_some("content", patch.content.clone())
            .set_some("category", patch.category.clone())
            .set_some("effective_date", patch.effective_date)
            .set_some("expiry_date", patch.expiry_date);

        if !update.is_empty() {
            update.execute(&self.pool, "policies", "id", id).await?;
        }
        self.find_policy(id).await
    }

    async fn delete_policy(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM policies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offset_saturates_on_huge_pages() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 25), 50);
        assert_eq!(page_offset(0, 10), 0);
        assert_eq!(page_offset(u64::MAX, 100), u64::MAX);
    }
}
