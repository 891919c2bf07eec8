use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User email
    pub sub: String,
    pub user_id: u64,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "hr@example.com")]
    pub email: String,
    #[schema(example = "changeme123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "access_token": "eyJ0eXAiOiJKV1QiLCJhbGciOiJIUzI1NiJ9...",
    "token_type": "bearer",
    "role": "hr",
    "user_id": 1
}))]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub role: Role,
    pub user_id: u64,
}

/// Self-service sign-up, always creates an employee account.
#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "changeme123")]
    pub password: String,
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Done")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
