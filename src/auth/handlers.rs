use crate::{
    auth::jwt::generate_access_token,
    config::Config,
    error::{AppError, AppResult},
    model::{role::Role, user::User},
    models::{LoginReqDto, RegisterReq, TokenResponse},
    service::users::{self, CreateUser},
    state::AppState,
};
use actix_web::{HttpResponse, web};
use tracing::{debug, error, info, instrument};

// auth end points

/// Self-service registration; always creates an employee.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Invalid email, password or name"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(state, config, payload), fields(email = %payload.email))]
pub async fn register(
    state: web::Data<AppState>,
    config: web::Data<Config>,
    payload: web::Json<RegisterReq>,
) -> AppResult<HttpResponse> {
    let req = payload.into_inner();
    let user = users::create_user(
        &state,
        config.leave_seed,
        CreateUser {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            role: Role::Employee,
            employee_code: None,
            phone: req.phone,
            department: req.department,
            position: req.position,
            hire_date: None,
        },
    )
    .await?;

    info!(user_id = user.id, "User registered");
    Ok(HttpResponse::Created().json(user))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Access token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials or inactive account"),
        (status = 422, description = "Email or password missing"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(state, config, payload), fields(email = %payload.email))]
pub async fn login(
    state: web::Data<AppState>,
    config: web::Data<Config>,
    payload: web::Json<LoginReqDto>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    if payload.email.trim().is_empty() || payload.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(AppError::validation("Email and password are required"));
    }

    let user = users::authenticate(&state, &payload.email, &payload.password).await?;
    debug!(user_id = user.id, "Password verified, generating access token");

    let access_token = generate_access_token(
        user.id,
        user.email.clone(),
        user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, user_id = user.id, "Failed to sign access token");
        AppError::Internal(format!("token signing failed: {e}"))
    })?;

    info!(user_id = user.id, "Login successful");

    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        role: user.role,
        user_id: user.id,
    }))
}
