//! Account data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a user account.
pub type UserId = i64;

/// Public view of an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub email_verified: bool,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Registration request.
#[derive(Clone, Debug, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Access and refresh JWTs issued on login or refresh.
#[derive(Clone, Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AccountInfo {
    pub email_verified: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Everything the account dashboard shows.
#[derive(Clone, Debug, Serialize)]
pub struct Dashboard {
    pub user: User,
    pub account_info: AccountInfo,
}

/// What a single-use account token is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::EmailVerification => "email_verification",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }
}

/// Password reset completion request.
#[derive(Clone, Debug, Deserialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password1: String,
    pub new_password2: String,
}

/// Password change request from a signed-in user.
#[derive(Clone, Debug, Deserialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}
