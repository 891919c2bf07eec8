//! Storage tests against a live MySQL schema.
//!
//! Run with `DATABASE_URL=mysql://... cargo test --test mysql_store -- --ignored`.

use chrono::{Days, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use hrms::db::{init_db, run_migrations};
use hrms::model::attendance::NewAttendance;
use hrms::model::leave::{
    DecisionRules, LeaveDecision, LeaveFilter, LeaveSeed, LeaveStatus, LeaveType, NewLeaveRequest,
    ShortfallPolicy,
};
use hrms::model::role::Role;
use hrms::model::user::{NewUser, User};
use hrms::store::{
    AttendanceStore, LeaveStore, MySqlStore, NotificationStore, StoreError, UserStore,
};

const FLOOR: DecisionRules = DecisionRules {
    seed: LeaveSeed {
        annual: 10.0,
        sick: 5.0,
        casual: 5.0,
    },
    shortfall: ShortfallPolicy::Floor,
};

async fn store() -> MySqlStore {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
    let pool = init_db(&url, 5).await.expect("connect");
    run_migrations(&pool).await.expect("migrate");
    MySqlStore::new(pool)
}

fn new_user(role: Role, email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        full_name: "Store Test".to_string(),
        role,
        employee_code: None,
        phone: None,
        department: None,
        position: None,
        hire_date: None,
    }
}

/// Emails are unique per run so the tests can share one database.
async fn fresh_user(store: &MySqlStore, role: Role) -> User {
    let email = format!("{}@store-test.example.com", Uuid::new_v4());
    store
        .insert_user(new_user(role, &email), LeaveSeed::default())
        .await
        .expect("insert user")
}

fn next_week() -> NaiveDate {
    Utc::now().date_naive() + Days::new(7)
}

async fn pending_sick(store: &MySqlStore, employee_id: u64, days: u64) -> u64 {
    let start = next_week();
    store
        .insert_leave_request(NewLeaveRequest {
            employee_id,
            leave_type: LeaveType::Sick,
            start_date: start,
            end_date: start + Days::new(days - 1),
            reason: "Flu".to_string(),
        })
        .await
        .expect("insert leave request")
        .id
}

#[actix_web::test]
#[ignore] // Requires a MySQL database
async fn approval_deducts_once_even_when_raced() {
    let store = store().await;
    let hr = fresh_user(&store, Role::Hr).await;
    let employee = fresh_user(&store, Role::Employee).await;
    let id = pending_sick(&store, employee.id, 3).await;

    let (a, b) = futures::join!(
        store.decide_leave_request(id, LeaveDecision::Approve, hr.id, FLOOR),
        store.decide_leave_request(id, LeaveDecision::Approve, hr.id, FLOOR),
    );
    assert!(a.is_ok() ^ b.is_ok());
    assert!(matches!(a.err().or(b.err()), Some(StoreError::Conflict(_))));

    let ledger = store.leave_balance(employee.id).await.unwrap().unwrap();
    assert_eq!(ledger.sick_leave, 2.0);
    assert_eq!(store.notifications_for(employee.id).await.unwrap().len(), 1);

    let again = store
        .decide_leave_request(id, LeaveDecision::Approve, hr.id, FLOOR)
        .await;
    assert!(matches!(again, Err(StoreError::Conflict(_))));
}

#[actix_web::test]
#[ignore] // Requires a MySQL database
async fn reject_after_approval_conflicts_and_changes_nothing() {
    let store = store().await;
    let hr = fresh_user(&store, Role::Hr).await;
    let employee = fresh_user(&store, Role::Employee).await;
    let id = pending_sick(&store, employee.id, 2).await;

    store
        .decide_leave_request(id, LeaveDecision::Approve, hr.id, FLOOR)
        .await
        .unwrap();
    let rejected = store
        .decide_leave_request(id, LeaveDecision::Reject, hr.id, FLOOR)
        .await;
    assert!(matches!(rejected, Err(StoreError::Conflict(_))));

    let request = store.find_leave_request(id).await.unwrap().unwrap();
    assert_eq!(request.status, LeaveStatus::Approved);
    assert_eq!(request.days_deducted, 2.0);
    assert_eq!(store.notifications_for(employee.id).await.unwrap().len(), 1);
}

#[actix_web::test]
#[ignore] // Requires a MySQL database
async fn approval_seeds_a_missing_ledger_row() {
    let store = store().await;
    let hr = fresh_user(&store, Role::Hr).await;
    let employee = fresh_user(&store, Role::Employee).await;
    let id = pending_sick(&store, employee.id, 1).await;

    let pool = init_db(&std::env::var("DATABASE_URL").unwrap(), 1)
        .await
        .unwrap();
    sqlx::query("DELETE FROM leave_balance WHERE employee_id = ?")
        .bind(employee.id)
        .execute(&pool)
        .await
        .unwrap();
    assert!(store.leave_balance(employee.id).await.unwrap().is_none());

    let outcome = store
        .decide_leave_request(id, LeaveDecision::Approve, hr.id, FLOOR)
        .await
        .unwrap();
    let ledger = outcome.balance.unwrap();
    assert_eq!(ledger.sick_leave, 4.0);
    assert_eq!(ledger.annual_leave, 10.0);
}

#[actix_web::test]
#[ignore] // Requires a MySQL database
async fn duplicate_check_in_is_a_conflict() {
    let store = store().await;
    let employee = fresh_user(&store, Role::Employee).await;
    let punch = || NewAttendance {
        employee_id: employee.id,
        date: Utc::now().date_naive(),
        check_in: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        late_entry: false,
    };

    store.insert_attendance(punch()).await.unwrap();
    let second = store.insert_attendance(punch()).await;
    assert!(matches!(second, Err(StoreError::Conflict(_))));
}

#[actix_web::test]
#[ignore] // Requires a MySQL database
async fn duplicate_email_is_a_conflict() {
    let store = store().await;
    let existing = fresh_user(&store, Role::Employee).await;

    let again = store
        .insert_user(new_user(Role::Employee, &existing.email), LeaveSeed::default())
        .await;
    assert!(matches!(again, Err(StoreError::Conflict(_))));
}

#[actix_web::test]
#[ignore] // Requires a MySQL database
async fn huge_page_numbers_return_an_empty_page() {
    let store = store().await;
    let employee = fresh_user(&store, Role::Employee).await;
    pending_sick(&store, employee.id, 1).await;

    let filter = LeaveFilter {
        employee_id: Some(employee.id),
        page: u64::MAX,
        per_page: 100,
        ..Default::default()
    };
    let (data, total) = store.list_leave_requests(&filter).await.unwrap();
    assert!(data.is_empty());
    assert_eq!(total, 1);
}
