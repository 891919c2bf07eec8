//! Business rules, independent of HTTP.
//!
//! Handlers check who may call an operation; the functions here check
//! whether the operation makes sense and drive the store.

pub mod assets;
pub mod attendance;
pub mod leave;
pub mod notifications;
pub mod policies;
pub mod users;

/// Page/per_page pair after defaults and bounds are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub per_page: u64,
}

impl Page {
    pub const DEFAULT_PER_PAGE: u64 = 10;
    pub const MAX_PER_PAGE: u64 = 100;

    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::{NaiveDate, NaiveTime};

    use crate::model::{leave::LeaveSeed, role::Role, user::User};
    use crate::state::AppState;
    use crate::store::MemoryStore;
    use crate::utils::clock::FixedClock;

    /// State over a fresh memory store, frozen at `date` 08:00.
    pub fn state_on(date: &str) -> (AppState, Arc<MemoryStore>) {
        state_at(date, "08:00")
    }

    pub fn state_at(date: &str, time: &str) -> (AppState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let clock = FixedClock::at(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
        );
        (AppState::new(store.clone(), Arc::new(clock)), store)
    }

    pub async fn user(state: &AppState, role: Role, email: &str) -> User {
        super::users::create_user(
            state,
            LeaveSeed::default(),
            super::users::CreateUser {
                email: email.to_string(),
                password: "changeme123".to_string(),
                full_name: email.split('@').next().unwrap_or(email).to_string(),
                role,
                employee_code: None,
                phone: None,
                department: None,
                position: None,
                hire_date: None,
            },
        )
        .await
        .unwrap()
    }
}
