use crate::{
    api::{assets, attendance, leave_request, notifications, policies, users},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, Responder, get, middleware::from_fn, web};
use anyhow::anyhow;
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP budgets, built once and shared by every worker.
#[derive(Clone)]
pub struct RateLimiters {
    login: Limiter,
    register: Limiter,
    protected: Limiter,
}

impl RateLimiters {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            register: build_limiter(config.rate_register_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} requests per minute"))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "hrms",
        "docs": "/swagger-ui/"
    }))
}

/// Malformed bodies, queries and path segments all surface as 422.
fn extractor_errors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::validation(err.to_string()).into()),
    );
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &RateLimiters) {
    extractor_errors(cfg);
    cfg.service(index);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(limiters.register.clone())
                    .route(web::post().to(handlers::register)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiters.protected.clone()) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave/request
                    .service(
                        web::resource("/request").route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/request/{id}
                    .service(
                        web::resource("/request/{id}").route(web::get().to(leave_request::get_leave)),
                    )
                    // /leave/request/{id}/approve
                    .service(
                        web::resource("/request/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/request/{id}/reject
                    .service(
                        web::resource("/request/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    )
                    // /leave/requests
                    .service(
                        web::resource("/requests").route(web::get().to(leave_request::leave_list)),
                    )
                    // /leave/balance/{employee_id}
                    .service(
                        web::resource("/balance/{employee_id}")
                            .route(web::get().to(leave_request::get_balance))
                            .route(web::put().to(leave_request::adjust_balance)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    )
                    .service(
                        web::resource("/today/{employee_id}").route(web::get().to(attendance::today)),
                    )
                    .service(web::resource("/records").route(web::get().to(attendance::records)))
                    .service(web::resource("/summary").route(web::get().to(attendance::summary))),
            )
            .service(
                web::scope("/users")
                    // /users
                    .service(
                        web::resource("")
                            .route(web::post().to(users::create_user))
                            .route(web::get().to(users::list_users)),
                    )
                    // /users/me must be registered before /users/{id}
                    .service(web::resource("/me").route(web::get().to(users::me)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(users::get_user))
                            .route(web::put().to(users::update_user))
                            .route(web::delete().to(users::delete_user)),
                    ),
            )
            .service(
                web::scope("/notifications")
                    .service(web::resource("").route(web::get().to(notifications::list)))
                    .service(
                        web::resource("/unread-count")
                            .route(web::get().to(notifications::unread_count)),
                    )
                    .service(
                        web::resource("/mark-all-read")
                            .route(web::put().to(notifications::mark_all_read)),
                    )
                    .service(
                        web::resource("/{id}/mark-read")
                            .route(web::put().to(notifications::mark_read)),
                    ),
            )
            .service(
                web::scope("/assets")
                    .service(
                        web::resource("")
                            .route(web::post().to(assets::create_asset))
                            .route(web::get().to(assets::list_assets)),
                    )
                    .service(
                        web::resource("/user/{user_id}").route(web::get().to(assets::user_assets)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(assets::get_asset))
                            .route(web::put().to(assets::update_asset))
                            .route(web::delete().to(assets::delete_asset)),
                    )
                    .service(
                        web::resource("/{id}/maintenance")
                            .route(web::post().to(assets::schedule_maintenance)),
                    ),
            )
            .service(
                web::scope("/policies")
                    .service(
                        web::resource("")
                            .route(web::post().to(policies::create_policy))
                            .route(web::get().to(policies::list_policies)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(policies::get_policy))
                            .route(web::put().to(policies::update_policy))
                            .route(web::delete().to(policies::delete_policy)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_still_builds_a_limiter() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(120_000).is_ok());
    }
}
