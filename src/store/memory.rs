//! In-process backend.
//!
//! Each call takes the single state lock once and releases it before
//! returning, so a multi-row change is either fully visible or not at all.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};

use super::{
    AssetStore, AttendanceStore, DecisionOutcome, LeaveStore, NotificationStore, PolicyStore,
    StoreError, StoreResult, UserStore,
};
use crate::model::{
    asset::{Asset, AssetPatch, NewAsset},
    attendance::{Attendance, AttendanceFilter, NewAttendance, STATUS_PRESENT},
    leave::{
        BalanceAdjustment, DecisionRules, LeaveBalance, LeaveDecision, LeaveFilter, LeaveRequest,
        LeaveSeed, LeaveStatus, NewLeaveRequest,
    },
    notification::{NewNotification, Notification},
    policy::{NewPolicy, Policy, PolicyPatch},
    role::Role,
    user::{Credentials, NewUser, User, UserFilter, UserPatch},
};

#[derive(Default)]
struct Sequences {
    users: u64,
    leave_requests: u64,
    notifications: u64,
    attendance: u64,
    assets: u64,
    policies: u64,
}

fn next(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

#[derive(Default)]
struct State {
    seq: Sequences,
    users: BTreeMap<u64, Credentials>,
    balances: HashMap<u64, LeaveBalance>,
    leave_requests: BTreeMap<u64, LeaveRequest>,
    notifications: BTreeMap<u64, Notification>,
    attendance: BTreeMap<u64, Attendance>,
    assets: BTreeMap<u64, Asset>,
    policies: BTreeMap<u64, Policy>,
}

impl State {
    fn email_taken(&self, email: &str, except: Option<u64>) -> bool {
        self.users
            .values()
            .any(|c| c.user.email == email && Some(c.user.id) != except)
    }

    fn code_taken(&self, code: &str, except: Option<u64>) -> bool {
        self.users.values().any(|c| {
            c.user.employee_code.as_deref() == Some(code) && Some(c.user.id) != except
        })
    }

    fn push_notification(&mut self, user_id: u64, message: String) -> Notification {
        let notification = Notification {
            id: next(&mut self.seq.notifications),
            user_id,
            message,
            is_read: false,
            created_at: Utc::now(),
        };
        self.notifications
            .insert(notification.id, notification.clone());
        notification
    }
}

fn paginate<T>(items: Vec<T>, page: u64, per_page: u64) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let offset = page.saturating_sub(1).saturating_mul(per_page) as usize;
    let data = items
        .into_iter()
        .skip(offset)
        .take(per_page as usize)
        .collect();
    (data, total)
}

/// Backend used by the test-suite and for local runs without MySQL.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_notifications: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every notification write fail, to exercise rollback paths.
    pub fn fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    fn notifications_failing(&self) -> StoreResult<()> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "notification sink is unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser, seed: LeaveSeed) -> StoreResult<User> {
        let mut state = self.lock()?;
        if state.email_taken(&user.email, None) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }
        if let Some(code) = user.employee_code.as_deref() {
            if state.code_taken(code, None) {
                return Err(StoreError::Conflict("Employee code already exists".to_string()));
            }
        }

        let now = Utc::now();
        let created = User {
            id: next(&mut state.seq.users),
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            employee_code: user.employee_code,
            phone: user.phone,
            department: user.department,
            position: user.position,
            hire_date: user.hire_date,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state
            .balances
            .insert(created.id, LeaveBalance::seeded(created.id, seed, now));
        state.users.insert(
            created.id,
            Credentials {
                user: created.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(created)
    }

    async fn find_user(&self, id: u64) -> StoreResult<Option<User>> {
        Ok(self.lock()?.users.get(&id).map(|c| c.user.clone()))
    }

    async fn find_credentials(&self, email: &str) -> StoreResult<Option<Credentials>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|c| c.user.email == email)
            .cloned())
    }

    async fn list_users(&self, filter: &UserFilter) -> StoreResult<(Vec<User>, i64)> {
        let state = self.lock()?;
        let users = state
            .users
            .values()
            .filter(|c| filter.role.is_none_or(|role| c.user.role == role))
            .map(|c| c.user.clone())
            .collect();
        Ok(paginate(users, filter.page, filter.per_page))
    }

    async fn users_with_role(&self, role: Role) -> StoreResult<Vec<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .filter(|c| c.user.role == role)
            .map(|c| c.user.clone())
            .collect())
    }

    async fn count_users(&self) -> StoreResult<i64> {
        Ok(self.lock()?.users.len() as i64)
    }

    async fn user_emails(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .lock()?
            .users
            .values()
            .map(|c| c.user.email.clone())
            .collect())
    }

    async fn update_user(&self, id: u64, patch: &UserPatch) -> StoreResult<Option<User>> {
        let mut state = self.lock()?;
        if !state.users.contains_key(&id) {
            return Ok(None);
        }
        if let Some(email) = patch.email.as_deref() {
            if state.email_taken(email, Some(id)) {
                return Err(StoreError::Conflict("Email already registered".to_string()));
            }
        }
        if let Some(code) = patch.employee_code.as_deref() {
            if state.code_taken(code, Some(id)) {
                return Err(StoreError::Conflict("Employee code already exists".to_string()));
            }
        }

        let Some(entry) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(&mut entry.user);
        if let Some(hash) = &patch.password_hash {
            entry.password_hash = hash.clone();
        }
        entry.user.updated_at = Utc::now();
        Ok(Some(entry.user.clone()))
    }

    async fn delete_user(&self, id: u64) -> StoreResult<bool> {
        let mut state = self.lock()?;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.balances.remove(&id);
        state.leave_requests.retain(|_, r| r.employee_id != id);
        state.notifications.retain(|_, n| n.user_id != id);
        state.attendance.retain(|_, a| a.employee_id != id);
        for asset in state.assets.values_mut() {
            if asset.assigned_to == Some(id) {
                asset.assigned_to = None;
            }
        }
        for policy in state.policies.values_mut() {
            if policy.created_by == Some(id) {
                policy.created_by = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn leave_balance(&self, employee_id: u64) -> StoreResult<Option<LeaveBalance>> {
        Ok(self.lock()?.balances.get(&employee_id).cloned())
    }

    async fn ensure_leave_balance(
        &self,
        employee_id: u64,
        seed: LeaveSeed,
    ) -> StoreResult<LeaveBalance> {
        let mut state = self.lock()?;
        if !state.users.contains_key(&employee_id) {
            return Err(StoreError::NotFound("User not found".to_string()));
        }
        Ok(state
            .balances
            .entry(employee_id)
            .or_insert_with(|| LeaveBalance::seeded(employee_id, seed, Utc::now()))
            .clone())
    }

    async fn adjust_leave_balance(
        &self,
        employee_id: u64,
        adjustment: &BalanceAdjustment,
        seed: LeaveSeed,
    ) -> StoreResult<LeaveBalance> {
        let mut state = self.lock()?;
        if !state.users.contains_key(&employee_id) {
            return Err(StoreError::NotFound("User not found".to_string()));
        }
        let now = Utc::now();
        let mut ledger = state
            .balances
            .get(&employee_id)
            .cloned()
            .unwrap_or_else(|| LeaveBalance::seeded(employee_id, seed, now));
        ledger
            .adjust(adjustment, now)
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        state.balances.insert(employee_id, ledger.clone());
        Ok(ledger)
    }

    async fn insert_leave_request(&self, request: NewLeaveRequest) -> StoreResult<LeaveRequest> {
        let mut state = self.lock()?;
        if !state.users.contains_key(&request.employee_id) {
            return Err(StoreError::NotFound("User not found".to_string()));
        }
        let now = Utc::now();
        let created = LeaveRequest {
            id: next(&mut state.seq.leave_requests),
            employee_id: request.employee_id,
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason,
            status: LeaveStatus::Pending,
            days_deducted: 0.0,
            decided_by: None,
            created_at: now,
            updated_at: now,
        };
        state.leave_requests.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_leave_request(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        Ok(self.lock()?.leave_requests.get(&id).cloned())
    }

    async fn list_leave_requests(
        &self,
        filter: &LeaveFilter,
    ) -> StoreResult<(Vec<LeaveRequest>, i64)> {
        let state = self.lock()?;
        let mut requests: Vec<LeaveRequest> = state
            .leave_requests
            .values()
            .filter(|r| filter.employee_id.is_none_or(|id| r.employee_id == id))
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(paginate(requests, filter.page, filter.per_page))
    }

    async fn approved_leave_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<LeaveRequest>> {
        Ok(self
            .lock()?
            .leave_requests
            .values()
            .filter(|r| {
                r.employee_id == employee_id
                    && r.status == LeaveStatus::Approved
                    && r.start_date >= from
                    && r.end_date <= to
            })
            .cloned()
            .collect())
    }

    async fn decide_leave_request(
        &self,
        id: u64,
        decision: LeaveDecision,
        decided_by: u64,
        rules: DecisionRules,
    ) -> StoreResult<DecisionOutcome> {
        let mut state = self.lock()?;
        let mut request = state
            .leave_requests
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("Leave request not found".to_string()))?;
        let now = Utc::now();

        // work on copies; nothing is written back until every step succeeded
        let balance = match decision {
            LeaveDecision::Approve => {
                let mut ledger = state
                    .balances
                    .get(&request.employee_id)
                    .cloned()
                    .unwrap_or_else(|| LeaveBalance::seeded(request.employee_id, rules.seed, now));
                request
                    .approve(decided_by, &mut ledger, rules.shortfall, now)
                    .map_err(|e| StoreError::Conflict(e.to_string()))?;
                Some(ledger)
            }
            LeaveDecision::Reject => {
                request
                    .reject(decided_by, now)
                    .map_err(|e| StoreError::Conflict(e.to_string()))?;
                None
            }
        };
        self.notifications_failing()?;

        if let Some(ledger) = &balance {
            state.balances.insert(ledger.employee_id, ledger.clone());
        }
        state.leave_requests.insert(id, request.clone());
        let notification = state.push_notification(request.employee_id, request.decision_message());

        Ok(DecisionOutcome {
            request,
            balance,
            notification,
        })
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> StoreResult<Notification> {
        self.notifications_failing()?;
        let mut state = self.lock()?;
        if !state.users.contains_key(&notification.user_id) {
            return Err(StoreError::NotFound("User not found".to_string()));
        }
        Ok(state.push_notification(notification.user_id, notification.message))
    }

    async fn notifications_for(&self, user_id: u64) -> StoreResult<Vec<Notification>> {
        let state = self.lock()?;
        let mut list: Vec<Notification> = state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(list)
    }

    async fn unread_count(&self, user_id: u64) -> StoreResult<i64> {
        Ok(self
            .lock()?
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_notification_read(&self, user_id: u64, id: u64) -> StoreResult<bool> {
        let mut state = self.lock()?;
        match state.notifications.get_mut(&id) {
            Some(n) if n.user_id == user_id => {
                n.is_read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: u64) -> StoreResult<u64> {
        let mut state = self.lock()?;
        let mut changed = 0;
        for n in state.notifications.values_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn insert_attendance(&self, record: NewAttendance) -> StoreResult<Attendance> {
        let mut state = self.lock()?;
        let duplicate = state
            .attendance
            .values()
            .any(|a| a.employee_id == record.employee_id && a.date == record.date);
        if duplicate {
            return Err(StoreError::Conflict("Already checked in today".to_string()));
        }

        let now = Utc::now();
        let created = Attendance {
            id: next(&mut state.seq.attendance),
            employee_id: record.employee_id,
            date: record.date,
            check_in: record.check_in,
            check_out: None,
            status: STATUS_PRESENT.to_string(),
            late_entry: record.late_entry,
            early_exit: false,
            created_at: now,
            updated_at: now,
        };
        state.attendance.insert(created.id, created.clone());
        Ok(created)
    }

    async fn attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<Attendance>> {
        Ok(self
            .lock()?
            .attendance
            .values()
            .find(|a| a.employee_id == employee_id && a.date == date)
            .cloned())
    }

    async fn record_check_out(
        &self,
        id: u64,
        check_out: NaiveTime,
        early_exit: bool,
    ) -> StoreResult<Option<Attendance>> {
        let mut state = self.lock()?;
        match state.attendance.get_mut(&id) {
            Some(record) if record.check_out.is_none() => {
                record.check_out = Some(check_out);
                record.early_exit = early_exit;
                record.updated_at = Utc::now();
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>> {
        let state = self.lock()?;
        let mut list: Vec<Attendance> = state
            .attendance
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        list.sort_by(|a, b| (b.date, b.id).cmp(&(a.date, a.id)));
        Ok(list)
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn insert_asset(&self, asset: NewAsset) -> StoreResult<Asset> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let created = Asset {
            id: next(&mut state.seq.assets),
            asset_name: asset.asset_name,
            category: asset.category,
            department: asset.department,
            condition: asset.condition,
            assigned_to: asset.assigned_to,
            purchase_date: asset.purchase_date,
            warranty_expiry: asset.warranty_expiry,
            maintenance_schedule: asset.maintenance_schedule,
            notes: asset.notes,
            created_at: now,
            updated_at: now,
        };
        state.assets.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_asset(&self, id: u64) -> StoreResult<Option<Asset>> {
        Ok(self.lock()?.assets.get(&id).cloned())
    }

    async fn list_assets(&self, assigned_to: Option<u64>) -> StoreResult<Vec<Asset>> {
        Ok(self
            .lock()?
            .assets
            .values()
            .filter(|a| assigned_to.is_none_or(|user| a.assigned_to == Some(user)))
            .cloned()
            .collect())
    }

    async fn update_asset(&self, id: u64, patch: &AssetPatch) -> StoreResult<Option<Asset>> {
        let mut state = self.lock()?;
        Ok(state.assets.get_mut(&id).map(|asset| {
            patch.apply(asset);
            asset.updated_at = Utc::now();
            asset.clone()
        }))
    }

    async fn delete_asset(&self, id: u64) -> StoreResult<bool> {
        Ok(self.lock()?.assets.remove(&id).is_some())
    }
}

#[async_trait]
impl PolicyStore for MemoryStore {
    async fn insert_policy(&self, policy: NewPolicy) -> StoreResult<Policy> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let created = Policy {
            id: next(&mut state.seq.policies),
            title: policy.title,
            description: policy.description,
            content: policy.content,
            category: policy.category,
            effective_date: policy.effective_date,
            expiry_date: policy.expiry_date,
            created_by: Some(policy.created_by),
            created_at: now,
            updated_at: now,
        };
        state.policies.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_policy(&self, id: u64) -> StoreResult<Option<Policy>> {
        Ok(self.lock()?.policies.get(&id).cloned())
    }

    async fn list_policies(&self, skip: u64, limit: u64) -> StoreResult<Vec<Policy>> {
        Ok(self
            .lock()?
            .policies
            .values()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update_policy(&self, id: u64, patch: &PolicyPatch) -> StoreResult<Option<Policy>> {
        let mut state = self.lock()?;
        Ok(state.policies.get_mut(&id).map(|policy| {
            patch.apply(policy);
            policy.updated_at = Utc::now();
            policy.clone()
        }))
    }

    async fn delete_policy(&self, id: u64) -> StoreResult<bool> {
        Ok(self.lock()?.policies.remove(&id).is_some())
    }
}
