use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::role::{Capability, Role};
use crate::models::Claims;
use crate::auth::jwt::verify_token;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, http::header::HeaderMap, web::Data};
use futures::future::{Ready, ready};

/// The authenticated caller, resolved from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role: claims.role,
        }
    }
}

/// Reads `Authorization: Bearer <token>` and validates it.
pub fn bearer_claims(headers: &HeaderMap, secret: &str) -> AppResult<Claims> {
    let header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header encoding".to_string()))?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Authorization header must start with Bearer".to_string())
    })?;

    verify_token(token, secret)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // the auth middleware has usually done the work already
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(AppError::Internal("Config missing".to_string()))),
        };

        ready(bearer_claims(req.headers(), &config.jwt_secret).map(AuthUser::from))
    }
}

impl AuthUser {
    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    pub fn require(&self, capability: Capability) -> AppResult<()> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Not authorized to perform this action ({capability})"
            )))
        }
    }

    /// Passes when the caller is `user_id` or holds `capability`.
    pub fn require_self_or(&self, user_id: u64, capability: Capability) -> AppResult<()> {
        if self.user_id == user_id {
            return Ok(());
        }
        self.require(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 42,
            email: "someone@example.com".into(),
            role,
        }
    }

    #[test]
    fn employee_may_act_on_own_records_only() {
        let employee = user(Role::Employee);
        assert!(employee.require_self_or(42, Capability::ViewAllRecords).is_ok());
        assert!(matches!(
            employee.require_self_or(7, Capability::ViewAllRecords),
            Err(AppError::Forbidden(_))
        ));
        assert!(employee.require(Capability::ApproveLeave).is_err());
    }

    #[test]
    fn hr_may_act_on_anyone() {
        let hr = user(Role::Hr);
        assert!(hr.require_self_or(7, Capability::ViewAllRecords).is_ok());
        assert!(hr.require(Capability::ApproveLeave).is_ok());
    }
}
