use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::Role;

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for forgot-password.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for reset-password.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Response carrying a fresh bearer token (signup, login).
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Plain status message (forgot-password, reset-password).
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Identity echoed back by /auth/me, straight from the verified claims.
#[derive(Debug, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: CurrentUser,
}
