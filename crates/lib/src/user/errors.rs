//! Error types for the user system
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UserError {
    #[error("User not found: {user}")]
    UserNotFound { user: String },

    #[error("Username already exists: {username}")]
    UsernameTaken { username: String },

    #[error("Email already registered: {email}")]
    EmailTaken { email: String },

    #[error("Invalid username: {reason}")]
    InvalidUsername { reason: String },

    #[error("Invalid email address: {email}")]
    InvalidEmail { email: String },

    #[error("Password rejected: {reason}")]
    WeakPassword { reason: String },

    #[error("The two password fields didn't match")]
    PasswordMismatch,

    #[error("Invalid username/email or password")]
    InvalidCredentials,

    /// The old password given for a password change is wrong.
    #[error("Old password is incorrect")]
    IncorrectPassword,

    #[error("Invalid token: {reason}")]
    InvalidToken { reason: String },

    #[error("Token has expired")]
    TokenExpired,

    #[error("Authentication credentials were not provided")]
    NotAuthenticated,

    /// A verification or reset link is unknown, used or expired.
    #[error("Invalid or expired {purpose} link")]
    InvalidLink { purpose: &'static str },

    #[error("Operation requires staff permission")]
    InsufficientPermissions,

    #[error("Password hashing failed: {reason}")]
    HashingFailed { reason: String },
}

impl UserError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, UserError::UserNotFound { .. })
    }

    /// Check if this error is a username or email collision.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            UserError::UsernameTaken { .. } | UserError::EmailTaken { .. }
        )
    }

    /// Check if this error is caused by invalid client input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            UserError::InvalidUsername { .. }
                | UserError::InvalidEmail { .. }
                | UserError::WeakPassword { .. }
                | UserError::PasswordMismatch
                | UserError::IncorrectPassword
                | UserError::InvalidLink { .. }
        )
    }

    /// Check if the caller failed to prove who they are.
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            UserError::InvalidCredentials
                | UserError::InvalidToken { .. }
                | UserError::TokenExpired
                | UserError::NotAuthenticated
        )
    }

    /// Check if the caller is known but not allowed.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, UserError::InsufficientPermissions)
    }
}

impl From<UserError> for crate::Error {
    fn from(err: UserError) -> Self {
        crate::Error::User(err)
    }
}
