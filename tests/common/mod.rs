#![allow(dead_code)]
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web::Data};
use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

use hrms::auth::jwt::generate_access_token;
use hrms::config::Config;
use hrms::model::{role::Role, user::User};
use hrms::routes::{self, RateLimiters};
use hrms::service::users::{CreateUser, create_user};
use hrms::state::AppState;
use hrms::store::MemoryStore;
use hrms::utils::clock::FixedClock;

pub const PASSWORD: &str = "changeme123";

/// Server state over a memory store with a frozen clock.
pub struct TestCtx {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub config: Config,
}

pub fn config_with(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("SERVER_ADDR", "127.0.0.1:8080"),
        ("DATABASE_URL", "mysql://unused@localhost/hrms"),
        ("JWT_SECRET", "integration-test-secret"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

impl TestCtx {
    /// Frozen at `date` (YYYY-MM-DD) and `time` (HH:MM).
    pub fn at(date: &str, time: &str) -> Self {
        Self::with_config(date, time, config_with(&[]))
    }

    pub fn with_config(date: &str, time: &str, config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = FixedClock::at(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("date"),
            NaiveTime::parse_from_str(time, "%H:%M").expect("time"),
        );
        Self {
            state: AppState::new(store.clone(), Arc::new(clock)),
            store,
            config,
        }
    }

    pub async fn user(&self, role: Role, email: &str) -> User {
        create_user(
            &self.state,
            self.config.leave_seed,
            CreateUser {
                email: email.to_string(),
                password: PASSWORD.to_string(),
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
        .expect("create user")
    }

    pub fn token(&self, user: &User) -> String {
        generate_access_token(
            user.id,
            user.email.clone(),
            user.role,
            &self.config.jwt_secret,
            self.config.access_token_ttl,
        )
        .expect("sign token")
    }

    /// Runs one request through the full route table and returns status and JSON body.
    pub async fn send(&self, req: test::TestRequest) -> (StatusCode, Value) {
        let config = self.config.clone();
        let limiters = RateLimiters::from_config(&config).expect("limiters");
        let app = test::init_service(
            App::new()
                .app_data(Data::new(self.state.clone()))
                .app_data(Data::new(config.clone()))
                .configure(|cfg| routes::configure(cfg, &config, &limiters)),
        )
        .await;

        let peer: SocketAddr = "127.0.0.1:40000".parse().expect("peer addr");
        let resp = test::call_service(&app, req.peer_addr(peer).to_request()).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, token: &str, uri: &str) -> (StatusCode, Value) {
        self.send(test::TestRequest::get().uri(uri).insert_header(bearer(token)))
            .await
    }

    pub async fn post(&self, token: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            test::TestRequest::post()
                .uri(uri)
                .insert_header(bearer(token))
                .set_json(body),
        )
        .await
    }

    pub async fn put(&self, token: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            test::TestRequest::put()
                .uri(uri)
                .insert_header(bearer(token))
                .set_json(body),
        )
        .await
    }

    pub async fn delete(&self, token: &str, uri: &str) -> (StatusCode, Value) {
        self.send(test::TestRequest::delete().uri(uri).insert_header(bearer(token)))
            .await
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}
