//! Leave ledger and leave request types.
//!
//! The transition rules live here so that every storage backend applies the
//! same arithmetic inside its own transaction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveType {
    Annual,
    Sick,
    Casual,
}

impl LeaveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveType::Annual => "annual",
            LeaveType::Sick => "sick",
            LeaveType::Casual => "casual",
        }
    }

    /// Reads a stored value; anything unrecognised is charged to the annual counter.
    pub fn from_stored(raw: &str) -> Self {
        raw.trim().parse().unwrap_or(LeaveType::Annual)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }
}

/// Inclusive number of calendar days between two dates.
pub fn day_span(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 7,
    "employee_id": 42,
    "leave_type": "sick",
    "start_date": "2024-06-10",
    "end_date": "2024-06-12",
    "reason": "Flu",
    "status": "approved",
    "days_deducted": 3.0,
    "decided_by": 1,
    "created_at": "2024-06-01T09:00:00Z",
    "updated_at": "2024-06-02T10:00:00Z"
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    /// Days actually taken from the ledger when the request was approved.
    pub days_deducted: f64,
    pub decided_by: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn day_span(&self) -> i64 {
        day_span(self.start_date, self.end_date)
    }

    /// Moves a pending request to approved and charges the ledger.
    ///
    /// Returns the number of days taken from the counter, which can be less
    /// than the span under [`ShortfallPolicy::Floor`].
    pub fn approve(
        &mut self,
        decided_by: u64,
        ledger: &mut LeaveBalance,
        policy: ShortfallPolicy,
        now: DateTime<Utc>,
    ) -> Result<f64, TransitionError> {
        self.ensure_pending()?;
        let taken = ledger.deduct(self.leave_type, self.day_span() as f64, policy, now)?;
        self.status = LeaveStatus::Approved;
        self.days_deducted = taken;
        self.decided_by = Some(decided_by);
        self.updated_at = now;
        Ok(taken)
    }

    pub fn reject(&mut self, decided_by: u64, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.ensure_pending()?;
        self.status = LeaveStatus::Rejected;
        self.decided_by = Some(decided_by);
        self.updated_at = now;
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), TransitionError> {
        if self.status != LeaveStatus::Pending {
            return Err(TransitionError::NotPending {
                id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    pub fn decision_message(&self) -> String {
        format!(
            "Your {} leave request from {} to {} has been {}.",
            self.leave_type, self.start_date, self.end_date, self.status
        )
    }

    pub fn new_request_message(&self, requester: &str) -> String {
        format!(
            "New {} leave request from {} for {} to {}.",
            self.leave_type, requester, self.start_date, self.end_date
        )
    }
}

#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct LeaveFilter {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LeaveDecision {
    Approve,
    Reject,
}

/// What happens when the matching counter cannot cover an approval.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ShortfallPolicy {
    /// Take what is left and stop at zero.
    #[default]
    Floor,
    /// Refuse the approval.
    Block,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LeaveSeed {
    pub annual: f64,
    pub sick: f64,
    pub casual: f64,
}

impl Default for LeaveSeed {
    fn default() -> Self {
        Self {
            annual: 10.0,
            sick: 5.0,
            casual: 5.0,
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct DecisionRules {
    pub seed: LeaveSeed,
    pub shortfall: ShortfallPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveBalance {
    pub employee_id: u64,
    pub annual_leave: f64,
    pub sick_leave: f64,
    pub casual_leave: f64,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl LeaveBalance {
    pub fn seeded(employee_id: u64, seed: LeaveSeed, now: DateTime<Utc>) -> Self {
        Self {
            employee_id,
            annual_leave: seed.annual,
            sick_leave: seed.sick,
            casual_leave: seed.casual,
            updated_at: now,
        }
    }

    pub fn counter(&self, leave_type: LeaveType) -> f64 {
        match leave_type {
            LeaveType::Annual => self.annual_leave,
            LeaveType::Sick => self.sick_leave,
            LeaveType::Casual => self.casual_leave,
        }
    }

    fn counter_mut(&mut self, leave_type: LeaveType) -> &mut f64 {
        match leave_type {
            LeaveType::Annual => &mut self.annual_leave,
            LeaveType::Sick => &mut self.sick_leave,
            LeaveType::Casual => &mut self.casual_leave,
        }
    }

    pub fn total(&self) -> f64 {
        self.annual_leave + self.sick_leave + self.casual_leave
    }

    pub fn deduct(
        &mut self,
        leave_type: LeaveType,
        days: f64,
        policy: ShortfallPolicy,
        now: DateTime<Utc>,
    ) -> Result<f64, Shortfall> {
        let counter = self.counter_mut(leave_type);
        let available = *counter;
        if available < days && policy == ShortfallPolicy::Block {
            return Err(Shortfall {
                leave_type,
                available,
                requested: days,
            });
        }
        let taken = days.min(available).max(0.0);
        *counter = (available - taken).max(0.0);
        self.updated_at = now;
        Ok(taken)
    }

    pub fn adjust(
        &mut self,
        adjustment: &BalanceAdjustment,
        now: DateTime<Utc>,
    ) -> Result<(), NegativeBalance> {
        let mut next = self.clone();
        for (leave_type, amount) in adjustment.amounts() {
            let counter = next.counter_mut(leave_type);
            *counter = match adjustment.mode {
                AdjustMode::Add => *counter + amount,
                AdjustMode::Set => amount,
            };
            if *counter < 0.0 {
                return Err(NegativeBalance {
                    leave_type,
                    value: *counter,
                });
            }
        }
        next.updated_at = now;
        *self = next;
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdjustMode {
    Add,
    Set,
}

#[derive(Debug, Clone)]
pub struct BalanceAdjustment {
    pub mode: AdjustMode,
    pub annual: Option<f64>,
    pub sick: Option<f64>,
    pub casual: Option<f64>,
}

impl BalanceAdjustment {
    fn amounts(&self) -> impl Iterator<Item = (LeaveType, f64)> {
        [
            (LeaveType::Annual, self.annual),
            (LeaveType::Sick, self.sick),
            (LeaveType::Casual, self.casual),
        ]
        .into_iter()
        .filter_map(|(leave_type, amount)| amount.map(|a| (leave_type, a)))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("insufficient {leave_type} leave balance: {available} day(s) remaining, {requested} requested")]
pub struct Shortfall {
    pub leave_type: LeaveType,
    pub available: f64,
    pub requested: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{leave_type} leave balance cannot become negative ({value})")]
pub struct NegativeBalance {
    pub leave_type: LeaveType,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("leave request {id} is already {status}")]
    NotPending { id: u64, status: LeaveStatus },
    #[error(transparent)]
    Shortfall(#[from] Shortfall),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn request(leave_type: LeaveType, start: &str, end: &str) -> LeaveRequest {
        let now = Utc::now();
        LeaveRequest {
            id: 1,
            employee_id: 42,
            leave_type,
            start_date: date(start),
            end_date: date(end),
            reason: String::new(),
            status: LeaveStatus::Pending,
            days_deducted: 0.0,
            decided_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn span_is_inclusive() {
        assert_eq!(day_span(date("2024-06-10"), date("2024-06-12")), 3);
        assert_eq!(day_span(date("2024-06-10"), date("2024-06-10")), 1);
        assert_eq!(day_span(date("2024-02-28"), date("2024-03-01")), 3);
    }

    #[test]
    fn unknown_stored_type_charges_annual() {
        assert_eq!(LeaveType::from_stored("Sick"), LeaveType::Sick);
        assert_eq!(LeaveType::from_stored("unpaid"), LeaveType::Annual);
        assert_eq!(LeaveType::from_stored(""), LeaveType::Annual);
    }

    #[test]
    fn approve_deducts_matching_counter() {
        let mut req = request(LeaveType::Sick, "2024-06-10", "2024-06-12");
        let mut ledger = LeaveBalance::seeded(42, LeaveSeed::default(), Utc::now());

        let taken = req
            .approve(1, &mut ledger, ShortfallPolicy::Floor, Utc::now())
            .unwrap();

        assert_eq!(taken, 3.0);
        assert_eq!(ledger.sick_leave, 2.0);
        assert_eq!(ledger.annual_leave, 10.0);
        assert_eq!(req.status, LeaveStatus::Approved);
        assert_eq!(req.days_deducted, 3.0);
        assert_eq!(req.decided_by, Some(1));
    }

    #[test]
    fn floor_policy_stops_at_zero_and_records_what_was_taken() {
        let mut req = request(LeaveType::Casual, "2024-06-10", "2024-06-17");
        let mut ledger = LeaveBalance::seeded(42, LeaveSeed::default(), Utc::now());

        let taken = req
            .approve(1, &mut ledger, ShortfallPolicy::Floor, Utc::now())
            .unwrap();

        assert_eq!(taken, 5.0);
        assert_eq!(ledger.casual_leave, 0.0);
        assert_eq!(req.days_deducted, 5.0);
    }

    #[test]
    fn block_policy_refuses_and_leaves_everything_untouched() {
        let mut req = request(LeaveType::Casual, "2024-06-10", "2024-06-17");
        let mut ledger = LeaveBalance::seeded(42, LeaveSeed::default(), Utc::now());

        let err = req
            .approve(1, &mut ledger, ShortfallPolicy::Block, Utc::now())
            .unwrap_err();

        assert!(matches!(err, TransitionError::Shortfall(_)));
        assert_eq!(ledger.casual_leave, 5.0);
        assert_eq!(req.status, LeaveStatus::Pending);
    }

    #[test]
    fn second_decision_is_refused() {
        let mut req = request(LeaveType::Annual, "2024-06-10", "2024-06-11");
        let mut ledger = LeaveBalance::seeded(42, LeaveSeed::default(), Utc::now());
        req.approve(1, &mut ledger, ShortfallPolicy::Floor, Utc::now())
            .unwrap();

        let again = req.approve(1, &mut ledger, ShortfallPolicy::Floor, Utc::now());
        assert_eq!(
            again.unwrap_err(),
            TransitionError::NotPending {
                id: 1,
                status: LeaveStatus::Approved
            }
        );
        assert!(req.reject(1, Utc::now()).is_err());
        assert_eq!(ledger.annual_leave, 8.0);
    }

    #[test]
    fn adjust_adds_sets_and_refuses_negative_results() {
        let mut ledger = LeaveBalance::seeded(42, LeaveSeed::default(), Utc::now());

        ledger
            .adjust(
                &BalanceAdjustment {
                    mode: AdjustMode::Add,
                    annual: Some(2.5),
                    sick: None,
                    casual: None,
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(ledger.annual_leave, 12.5);

        ledger
            .adjust(
                &BalanceAdjustment {
                    mode: AdjustMode::Set,
                    annual: None,
                    sick: Some(0.0),
                    casual: None,
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(ledger.sick_leave, 0.0);

        let err = ledger
            .adjust(
                &BalanceAdjustment {
                    mode: AdjustMode::Add,
                    annual: Some(1.0),
                    sick: None,
                    casual: Some(-6.0),
                },
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(err.leave_type, LeaveType::Casual);
        // nothing applied when any counter would go negative
        assert_eq!(ledger.annual_leave, 12.5);
        assert_eq!(ledger.casual_leave, 5.0);
    }

    #[test]
    fn messages_mention_type_and_dates() {
        let mut req = request(LeaveType::Sick, "2024-06-10", "2024-06-12");
        assert_eq!(
            req.new_request_message("Jane Doe"),
            "New sick leave request from Jane Doe for 2024-06-10 to 2024-06-12."
        );
        req.reject(1, Utc::now()).unwrap();
        assert_eq!(
            req.decision_message(),
            "Your sick leave request from 2024-06-10 to 2024-06-12 has been rejected."
        );
    }
}
