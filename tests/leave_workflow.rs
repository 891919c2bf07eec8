mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use common::TestCtx;
use hrms::model::role::Role;
use serde_json::json;

fn sick_leave(start: &str, end: &str) -> serde_json::Value {
    json!({
        "leave_type": "sick",
        "start_date": start,
        "end_date": end,
        "reason": "Flu"
    })
}

#[actix_web::test]
async fn request_approve_and_read_balance_over_http() {
    let ctx = TestCtx::at("2024-06-01", "08:00");
    let hr = ctx.user(Role::Hr, "hr@example.com").await;
    let emp = ctx.user(Role::Employee, "emp@example.com").await;
    let (hr_token, emp_token) = (ctx.token(&hr), ctx.token(&emp));

    let (status, created) = ctx
        .post(&emp_token, "/api/leave/request", sick_leave("2024-06-10", "2024-06-12"))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["employee_id"], emp.id);
    let id = created["id"].as_u64().unwrap();

    let (_, unread) = ctx.get(&hr_token, "/api/notifications/unread-count").await;
    assert_eq!(unread["count"], 1);

    let (status, decided) = ctx
        .put(&hr_token, &format!("/api/leave/request/{id}/approve"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["request"]["status"], "approved");
    assert_eq!(decided["request"]["days_deducted"], 3.0);
    assert_eq!(decided["balance"]["sick_leave"], 2.0);

    let (status, again) = ctx
        .put(&hr_token, &format!("/api/leave/request/{id}/approve"), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["error"], "conflict");

    let (status, balance) = ctx
        .get(&emp_token, &format!("/api/leave/balance/{}", emp.id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(balance["sick_leave"], 2.0);
    assert_eq!(balance["total_remaining"], 17.0);
    assert_eq!(balance["approved_requests_this_year"], 1);
    assert_eq!(balance["days_taken_this_year"], 3);

    let (_, inbox) = ctx.get(&emp_token, "/api/notifications").await;
    let messages = inbox.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0]["message"].as_str().unwrap().contains("approved"));
}

#[actix_web::test]
async fn employees_cannot_decide_or_peek() {
    let ctx = TestCtx::at("2024-06-01", "08:00");
    let emp = ctx.user(Role::Employee, "emp@example.com").await;
    let other = ctx.user(Role::Employee, "other@example.com").await;
    let emp_token = ctx.token(&emp);

    let (_, created) = ctx
        .post(&emp_token, "/api/leave/request", sick_leave("2024-06-10", "2024-06-10"))
        .await;
    let id = created["id"].as_u64().unwrap();

    let (status, body) = ctx
        .put(&emp_token, &format!("/api/leave/request/{id}/approve"), json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = ctx
        .get(&emp_token, &format!("/api/leave/balance/{}", other.id))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .post(
            &emp_token,
            "/api/leave/request",
            json!({
                "employee_id": other.id,
                "leave_type": "annual",
                "start_date": "2024-06-10",
                "end_date": "2024-06-10"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .put(
            &emp_token,
            &format!("/api/leave/balance/{}", emp.id),
            json!({"mode": "add", "annual": 5.0}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn missing_or_bad_token_is_unauthorized() {
    let ctx = TestCtx::at("2024-06-01", "08:00");

    let (status, body) = ctx
        .send(TestRequest::get().uri("/api/leave/requests"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx.get("not-a-jwt", "/api/leave/requests").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn invalid_payloads_are_unprocessable() {
    let ctx = TestCtx::at("2024-06-01", "08:00");
    let emp = ctx.user(Role::Employee, "emp@example.com").await;
    let token = ctx.token(&emp);

    let (status, body) = ctx
        .post(&token, "/api/leave/request", sick_leave("2024-06-12", "2024-06-10"))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = ctx
        .post(&token, "/api/leave/request", sick_leave("2024-05-01", "2024-05-02"))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx
        .post(&token, "/api/leave/request", sick_leave("10/06/2024", "2024-06-12"))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx
        .post(
            &token,
            "/api/leave/request",
            json!({"leave_type": "sabbatical", "start_date": "2024-06-10", "end_date": "2024-06-10"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx.get(&token, "/api/leave/request/abc").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn request_beyond_total_balance_conflicts() {
    let ctx = TestCtx::at("2024-06-01", "08:00");
    let emp = ctx.user(Role::Employee, "emp@example.com").await;
    let token = ctx.token(&emp);

    let (status, body) = ctx
        .post(&token, "/api/leave/request", sick_leave("2024-06-01", "2024-06-30"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("Insufficient"));
}

#[actix_web::test]
async fn listing_is_scoped_for_employees_and_filterable_for_hr() {
    let ctx = TestCtx::at("2024-06-01", "08:00");
    let hr = ctx.user(Role::Hr, "hr@example.com").await;
    let a = ctx.user(Role::Employee, "a@example.com").await;
    let b = ctx.user(Role::Employee, "b@example.com").await;
    let (hr_token, a_token, b_token) = (ctx.token(&hr), ctx.token(&a), ctx.token(&b));

    ctx.post(&a_token, "/api/leave/request", sick_leave("2024-06-10", "2024-06-10")).await;
    ctx.post(&a_token, "/api/leave/request", sick_leave("2024-06-11", "2024-06-11")).await;
    let (_, b_req) = ctx
        .post(&b_token, "/api/leave/request", sick_leave("2024-06-12", "2024-06-12"))
        .await;
    let b_id = b_req["id"].as_u64().unwrap();
    ctx.put(&hr_token, &format!("/api/leave/request/{b_id}/reject"), json!({})).await;

    let (status, own) = ctx.get(&a_token, "/api/leave/requests").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(own["total"], 2);

    let (status, _) = ctx
        .get(&a_token, &format!("/api/leave/requests?employee_id={}", b.id))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, all) = ctx.get(&hr_token, "/api/leave/requests?per_page=1").await;
    assert_eq!(all["total"], 3);
    assert_eq!(all["per_page"], 1);
    assert_eq!(all["data"].as_array().unwrap().len(), 1);

    let (_, rejected) = ctx.get(&hr_token, "/api/leave/requests?status=rejected").await;
    assert_eq!(rejected["total"], 1);
    assert_eq!(rejected["data"][0]["id"], b_id);

    let (status, hidden) = ctx.get(&a_token, &format!("/api/leave/request/{b_id}")).await;
    let (_, missing) = ctx.get(&a_token, "/api/leave/request/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(hidden, missing);

    let (status, huge) = ctx
        .get(&hr_token, "/api/leave/requests?page=18446744073709551615&per_page=100")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(huge["total"], 3);
    assert!(huge["data"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn block_policy_refuses_short_approvals() {
    let config = common::config_with(&[("LEAVE_SHORTFALL_POLICY", "block")]);
    let ctx = TestCtx::with_config("2024-06-01", "08:00", config);
    let hr = ctx.user(Role::Hr, "hr@example.com").await;
    let emp = ctx.user(Role::Employee, "emp@example.com").await;

    let (_, created) = ctx
        .post(&ctx.token(&emp), "/api/leave/request", sick_leave("2024-06-10", "2024-06-17"))
        .await;
    let id = created["id"].as_u64().unwrap();

    let (status, _) = ctx
        .put(&ctx.token(&hr), &format!("/api/leave/request/{id}/approve"), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, balance) = ctx
        .get(&ctx.token(&hr), &format!("/api/leave/balance/{}", emp.id))
        .await;
    assert_eq!(balance["sick_leave"], 5.0);
}

#[actix_web::test]
async fn failed_decision_notification_returns_500_and_keeps_request_pending() {
    let ctx = TestCtx::at("2024-06-01", "08:00");
    let hr = ctx.user(Role::Hr, "hr@example.com").await;
    let emp = ctx.user(Role::Employee, "emp@example.com").await;

    let (_, created) = ctx
        .post(&ctx.token(&emp), "/api/leave/request", sick_leave("2024-06-10", "2024-06-12"))
        .await;
    let id = created["id"].as_u64().unwrap();

    ctx.store.fail_notifications(true);
    let (status, body) = ctx
        .put(&ctx.token(&hr), &format!("/api/leave/request/{id}/approve"), json!({}))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal Server Error");
    ctx.store.fail_notifications(false);

    let (_, request) = ctx
        .get(&ctx.token(&hr), &format!("/api/leave/request/{id}"))
        .await;
    assert_eq!(request["status"], "pending");
}

#[actix_web::test]
async fn hr_can_top_up_a_ledger() {
    let ctx = TestCtx::at("2024-06-01", "08:00");
    let hr = ctx.user(Role::Hr, "hr@example.com").await;
    let emp = ctx.user(Role::Employee, "emp@example.com").await;
    let token = ctx.token(&hr);

    let (status, ledger) = ctx
        .put(
            &token,
            &format!("/api/leave/balance/{}", emp.id),
            json!({"mode": "add", "annual": 2.5}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ledger["annual_leave"], 12.5);

    let (status, _) = ctx
        .put(
            &token,
            &format!("/api/leave/balance/{}", emp.id),
            json!({"mode": "set", "casual": -1.0}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx
        .put(&token, "/api/leave/balance/9999", json!({"mode": "add", "annual": 1.0}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
