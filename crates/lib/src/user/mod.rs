//! User accounts and sessions.
//!
//! [`Users`] covers the whole account lifecycle:
//!
//! - registration with a verification email
//! - login by username or email, issuing an access/refresh JWT pair
//! - refresh, email verification, password reset and password change
//!
//! Verification and reset links carry a random token. Only its SHA-256 is
//! stored, together with its purpose, expiry and the time it was used.

pub mod crypto;
mod errors;
pub mod mailer;
pub mod token;
mod types;

use std::sync::Arc;

use url::Url;

use crate::backend::{self, Backend, SqlxResultExt};
use crate::config::AuthConfig;
use crate::constants::MIN_PASSWORD_LEN;
use crate::{Clock, Error, Result};

pub use errors::UserError;
#[cfg(any(test, feature = "testing"))]
pub use mailer::MemoryMailer;
pub use mailer::{Email, LogMailer, Mailer};
pub use token::{Claims, JwtSigner, TokenKind};
pub use types::{
    AccountInfo, Dashboard, NewUser, PasswordChange, PasswordResetConfirm, TokenPair, TokenPurpose,
    User, UserId,
};

const USER_COLUMNS: &str =
    "id, username, email, email_verified, is_staff, date_joined, last_login";

type UserRow = (i64, String, String, i64, i64, i64, Option<i64>);

fn user_from_row(
    (id, username, email, email_verified, is_staff, date_joined, last_login): UserRow,
) -> Result<User> {
    Ok(User {
        id,
        username,
        email,
        email_verified: email_verified != 0,
        is_staff: is_staff != 0,
        date_joined: backend::timestamp("users", date_joined)?,
        last_login: last_login
            .map(|millis| backend::timestamp("users", millis))
            .transpose()?,
    })
}

/// Check a username: 3 to 150 characters of letters, digits, `_`, `.` or `-`.
pub fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if !(3..=150).contains(&len) {
        return Err(UserError::InvalidUsername {
            reason: "must be between 3 and 150 characters".to_string(),
        }
        .into());
    }
    if let Some(c) = username
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return Err(UserError::InvalidUsername {
            reason: format!("character '{c}' is not allowed"),
        }
        .into());
    }
    Ok(())
}

/// Check an email address: a single `@` with something on both sides.
pub fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(UserError::InvalidEmail {
            email: email.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Check a new password against the account it is for.
pub fn validate_password(password: &str, username: &str) -> Result<()> {
    let weak = |reason: &str| -> Result<()> {
        Err(UserError::WeakPassword {
            reason: reason.to_string(),
        }
        .into())
    };
    if password.chars().count() < MIN_PASSWORD_LEN {
        return weak(&format!("must be at least {MIN_PASSWORD_LEN} characters"));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return weak("cannot be entirely numeric");
    }
    if !username.is_empty() && password.eq_ignore_ascii_case(username) {
        return weak("too similar to the username");
    }
    Ok(())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Account service.
///
/// Cheap to clone; all clones share the same backend, clock and mailer.
#[derive(Clone, Debug)]
pub struct Users {
    inner: Arc<UsersInner>,
}

#[derive(Debug)]
struct UsersInner {
    backend: Backend,
    clock: Arc<dyn Clock>,
    config: AuthConfig,
    signer: JwtSigner,
    mailer: Arc<dyn Mailer>,
}

impl Users {
    pub(crate) fn new(
        backend: Backend,
        clock: Arc<dyn Clock>,
        config: AuthConfig,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let signer = JwtSigner::new(config.jwt_secret.as_bytes());
        Self {
            inner: Arc::new(UsersInner {
                backend,
                clock,
                config,
                signer,
                mailer,
            }),
        }
    }

    fn pool(&self) -> &sqlx::SqlitePool {
        self.inner.backend.pool()
    }

    /// Look up an account by id.
    pub async fn get(&self, id: UserId) -> Result<User> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id)
                .fetch_optional(self.pool())
                .await
                .sql_context("Failed to load user")?;
        match row {
            Some(row) => user_from_row(row),
            None => Err(UserError::UserNotFound {
                user: id.to_string(),
            }
            .into()),
        }
    }

    /// Whether no account uses `username` (case-insensitive).
    pub async fn username_available(&self, username: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE username = ?")
            .bind(username.trim())
            .fetch_optional(self.pool())
            .await
            .sql_context("Failed to check username")?;
        Ok(row.is_none())
    }

    /// Whether no account uses `email` (case-insensitive).
    pub async fn email_available(&self, email: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE email = ?")
            .bind(normalize_email(email))
            .fetch_optional(self.pool())
            .await
            .sql_context("Failed to check email")?;
        Ok(row.is_none())
    }

    /// Create an account and send its verification email.
    ///
    /// A failed email delivery is logged; the account is still created and
    /// the user can ask for another verification email.
    ///
    /// # Errors
    /// * validation errors for the username, email or password
    /// * [`UserError::UsernameTaken`] or [`UserError::EmailTaken`]
    pub async fn register(&self, new: NewUser) -> Result<User> {
        let username = new.username.trim().to_string();
        let email = normalize_email(&new.email);
        validate_username(&username)?;
        validate_email(&email)?;
        validate_password(&new.password, &username)?;

        if !self.username_available(&username).await? {
            return Err(UserError::UsernameTaken { username }.into());
        }
        if !self.email_available(&email).await? {
            return Err(UserError::EmailTaken { email }.into());
        }

        let password_hash = crypto::hash_password(&new.password)?;
        let now = self.inner.clock.now_millis();
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, date_joined)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&username)
        .bind(&email)
        .bind(&password_hash)
        .bind(now)
        .execute(self.pool())
        .await
        .sql_context("Failed to insert user");

        // A concurrent registration can still win the unique constraint.
        let id = match result {
            Ok(result) => result.last_insert_rowid(),
            Err(Error::Backend(err)) if err.is_unique_violation() => {
                return Err(UserError::UsernameTaken { username }.into());
            }
            Err(err) => return Err(err),
        };

        let user = self.get(id).await?;
        tracing::info!(user_id = user.id, username = %user.username, "Registered user");

        if let Err(err) = self.send_verification_email(&user).await {
            tracing::warn!(user_id = user.id, error = %err, "Failed to send verification email");
        }
        Ok(user)
    }

    /// Check credentials and record the login time.
    ///
    /// `login` is matched against both username and email.
    ///
    /// # Errors
    /// * [`UserError::InvalidCredentials`] for an unknown login or wrong password
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User> {
        let login = login.trim();
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE username = ? OR email = ?")
                .bind(login)
                .bind(normalize_email(login))
                .fetch_optional(self.pool())
                .await
                .sql_context("Failed to look up user")?;

        let Some((id, password_hash)) = row else {
            tracing::debug!(login, "Login for unknown account");
            return Err(UserError::InvalidCredentials.into());
        };
        crypto::verify_password(password, &password_hash)?;

        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(self.inner.clock.now_millis())
            .bind(id)
            .execute(self.pool())
            .await
            .sql_context("Failed to record login")?;

        self.get(id).await
    }

    /// Issue a fresh access/refresh token pair for `user`.
    pub fn issue_tokens(&self, user: &User) -> Result<TokenPair> {
        let config = &self.inner.config;
        let now = self.inner.clock.now_secs();
        let sign = |typ: TokenKind, ttl: i64| -> Result<(String, i64)> {
            let claims = Claims {
                sub: user.id,
                typ,
                iat: now,
                exp: now + ttl,
                jti: uuid::Uuid::new_v4().to_string(),
            };
            Ok((self.inner.signer.sign(&claims)?, claims.exp))
        };

        let (access, access_exp) = sign(TokenKind::Access, config.access_ttl_secs)?;
        let (refresh, refresh_exp) = sign(TokenKind::Refresh, config.refresh_ttl_secs)?;
        Ok(TokenPair {
            access,
            refresh,
            access_expires_at: backend::timestamp("users", access_exp * 1000)?,
            refresh_expires_at: backend::timestamp("users", refresh_exp * 1000)?,
        })
    }

    /// Resolve an access token to its user.
    pub async fn user_from_access_token(&self, token: &str) -> Result<User> {
        let claims =
            self.inner
                .signer
                .verify(token, TokenKind::Access, self.inner.clock.now_secs())?;
        self.token_subject(claims.sub).await
    }

    async fn token_subject(&self, id: UserId) -> Result<User> {
        self.get(id).await.map_err(|err| -> Error {
            if err.is_not_found() {
                UserError::InvalidToken {
                    reason: "account no longer exists".to_string(),
                }
                .into()
            } else {
                err
            }
        })
    }

    /// Exchange a refresh token for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(User, TokenPair)> {
        let claims = self.inner.signer.verify(
            refresh_token,
            TokenKind::Refresh,
            self.inner.clock.now_secs(),
        )?;
        let user = self.token_subject(claims.sub).await?;
        let tokens = self.issue_tokens(&user)?;
        Ok((user, tokens))
    }

    fn frontend_link(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.inner.config.frontend_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("frontend url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Store a new single-use token for `user` and return it.
    ///
    /// Older unused tokens with the same purpose are invalidated first.
    async fn issue_account_token(&self, user: UserId, purpose: TokenPurpose) -> Result<String> {
        let ttl = match purpose {
            TokenPurpose::EmailVerification => self.inner.config.verification_ttl_secs,
            TokenPurpose::PasswordReset => self.inner.config.reset_ttl_secs,
        };
        let now = self.inner.clock.now_millis();
        let token = crypto::generate_token();

        let mut tx = self
            .pool()
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;
        sqlx::query(
            "UPDATE user_tokens SET used_at = ?
             WHERE user_id = ? AND purpose = ? AND used_at IS NULL",
        )
        .bind(now)
        .bind(user)
        .bind(purpose.as_str())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to invalidate account tokens")?;
        sqlx::query(
            "INSERT INTO user_tokens (token_hash, user_id, purpose, expires_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(crypto::hash_token(&token))
        .bind(user)
        .bind(purpose.as_str())
        .bind(now + ttl * 1000)
        .execute(&mut *tx)
        .await
        .sql_context("Failed to store account token")?;
        tx.commit().await.sql_context("Failed to commit account token")?;

        Ok(token)
    }

    /// Find the user a live token of `purpose` belongs to.
    async fn live_token_owner(&self, token: &str, purpose: TokenPurpose) -> Result<Option<UserId>> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT user_id FROM user_tokens
             WHERE token_hash = ? AND purpose = ? AND used_at IS NULL AND expires_at > ?",
        )
        .bind(crypto::hash_token(token))
        .bind(purpose.as_str())
        .bind(self.inner.clock.now_millis())
        .fetch_optional(self.pool())
        .await
        .sql_context("Failed to look up account token")?;
        Ok(row.map(|(user,)| user))
    }

    /// Mark a live token used. Returns false if another caller got there first.
    async fn consume_token(&self, token: &str, purpose: TokenPurpose) -> Result<bool> {
        let now = self.inner.clock.now_millis();
        let result = sqlx::query(
            "UPDATE user_tokens SET used_at = ?
             WHERE token_hash = ? AND purpose = ? AND used_at IS NULL AND expires_at > ?",
        )
        .bind(now)
        .bind(crypto::hash_token(token))
        .bind(purpose.as_str())
        .bind(now)
        .execute(self.pool())
        .await
        .sql_context("Failed to consume account token")?;
        Ok(result.rows_affected() == 1)
    }

    async fn send_verification_email(&self, user: &User) -> Result<()> {
        let token = self
            .issue_account_token(user.id, TokenPurpose::EmailVerification)
            .await?;
        let link = self.frontend_link(&["confirm-email", &token])?;
        self.inner
            .mailer
            .send(Email {
                to: user.email.clone(),
                subject: "Confirm your email address".to_string(),
                body: format!(
                    "Hi {},\n\nConfirm your email address by opening:\n{link}\n",
                    user.username
                ),
                link,
            })
            .await
    }

    /// Send a new verification email. Does nothing if already verified.
    pub async fn resend_verification(&self, user: UserId) -> Result<()> {
        let user = self.get(user).await?;
        if user.email_verified {
            return Ok(());
        }
        self.send_verification_email(&user).await
    }

    /// Mark the email address behind a verification token as verified.
    ///
    /// Opening a verification link for an address that is already verified
    /// succeeds even when the token itself was already used.
    ///
    /// # Errors
    /// * [`UserError::InvalidLink`] if the token is unknown, or unused but expired
    pub async fn verify_email(&self, token: &str) -> Result<User> {
        let purpose = TokenPurpose::EmailVerification;
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT user_id FROM user_tokens WHERE token_hash = ? AND purpose = ?")
                .bind(crypto::hash_token(token))
                .bind(purpose.as_str())
                .fetch_optional(self.pool())
                .await
                .sql_context("Failed to look up verification token")?;
        let invalid = || -> Error {
            UserError::InvalidLink {
                purpose: "email verification",
            }
            .into()
        };
        let Some((user_id,)) = row else {
            return Err(invalid());
        };

        let user = self.get(user_id).await?;
        if user.email_verified {
            return Ok(user);
        }
        if !self.consume_token(token, purpose).await? {
            return Err(invalid());
        }

        sqlx::query("UPDATE users SET email_verified = 1 WHERE id = ?")
            .bind(user_id)
            .execute(self.pool())
            .await
            .sql_context("Failed to verify email")?;
        tracing::info!(user_id, "Email verified");
        self.get(user_id).await
    }

    /// Email a password reset link to the account using `email`.
    ///
    /// Succeeds without sending anything when no account uses the address,
    /// so callers cannot probe which emails are registered.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
                .bind(&email)
                .fetch_optional(self.pool())
                .await
                .sql_context("Failed to look up user")?;
        let Some(row) = row else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };
        let user = user_from_row(row)?;

        let token = self
            .issue_account_token(user.id, TokenPurpose::PasswordReset)
            .await?;
        let link = self.frontend_link(&["reset-password", &token])?;
        self.inner
            .mailer
            .send(Email {
                to: user.email.clone(),
                subject: "Reset your password".to_string(),
                body: format!(
                    "Hi {},\n\nSomeone asked to reset your password. If it was you, open:\n{link}\n\
                     Otherwise you can ignore this email.\n",
                    user.username
                ),
                link,
            })
            .await
    }

    /// Check that a reset token is live without consuming it.
    pub async fn check_reset_token(&self, token: &str) -> Result<()> {
        match self.live_token_owner(token, TokenPurpose::PasswordReset).await? {
            Some(_) => Ok(()),
            None => Err(UserError::InvalidLink {
                purpose: "password reset",
            }
            .into()),
        }
    }

    /// Set a new password using a reset token. The token is consumed.
    ///
    /// # Errors
    /// * [`UserError::PasswordMismatch`] if the two passwords differ
    /// * [`UserError::WeakPassword`] if the new password is rejected
    /// * [`UserError::InvalidLink`] if the token is unknown, used or expired
    pub async fn confirm_password_reset(&self, request: PasswordResetConfirm) -> Result<()> {
        if request.new_password1 != request.new_password2 {
            return Err(UserError::PasswordMismatch.into());
        }
        let invalid = || -> Error {
            UserError::InvalidLink {
                purpose: "password reset",
            }
            .into()
        };
        let Some(user_id) = self
            .live_token_owner(&request.token, TokenPurpose::PasswordReset)
            .await?
        else {
            return Err(invalid());
        };

        let user = self.get(user_id).await?;
        validate_password(&request.new_password1, &user.username)?;

        if !self
            .consume_token(&request.token, TokenPurpose::PasswordReset)
            .await?
        {
            return Err(invalid());
        }
        self.store_password(user_id, &request.new_password1).await?;
        tracing::info!(user_id, "Password reset");
        Ok(())
    }

    /// Change the password of a signed-in user.
    ///
    /// # Errors
    /// * [`UserError::IncorrectPassword`] if `old_password` is wrong
    /// * [`UserError::PasswordMismatch`] if the two new passwords differ
    /// * [`UserError::WeakPassword`] if the new password is rejected
    pub async fn change_password(&self, user_id: UserId, request: PasswordChange) -> Result<()> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT username, password_hash FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(self.pool())
                .await
                .sql_context("Failed to load user")?;
        let Some((username, password_hash)) = row else {
            return Err(UserError::UserNotFound {
                user: user_id.to_string(),
            }
            .into());
        };

        if crypto::verify_password(&request.old_password, &password_hash).is_err() {
            return Err(UserError::IncorrectPassword.into());
        }
        if request.new_password1 != request.new_password2 {
            return Err(UserError::PasswordMismatch.into());
        }
        validate_password(&request.new_password1, &username)?;

        self.store_password(user_id, &request.new_password1).await?;
        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    async fn store_password(&self, user_id: UserId, password: &str) -> Result<()> {
        let password_hash = crypto::hash_password(password)?;
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(self.pool())
            .await
            .sql_context("Failed to update password")?;
        Ok(())
    }

    /// Grant or revoke staff rights.
    pub async fn set_staff(&self, user_id: UserId, is_staff: bool) -> Result<User> {
        let result = sqlx::query("UPDATE users SET is_staff = ? WHERE id = ?")
            .bind(i64::from(is_staff))
            .bind(user_id)
            .execute(self.pool())
            .await
            .sql_context("Failed to update staff flag")?;
        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound {
                user: user_id.to_string(),
            }
            .into());
        }
        self.get(user_id).await
    }

    /// Fail unless `user` is staff.
    pub fn require_staff(user: &User) -> Result<()> {
        if user.is_staff {
            Ok(())
        } else {
            Err(UserError::InsufficientPermissions.into())
        }
    }

    /// Account overview for the dashboard page.
    pub async fn dashboard(&self, user_id: UserId) -> Result<Dashboard> {
        let user = self.get(user_id).await?;
        let account_info = AccountInfo {
            email_verified: user.email_verified,
            date_joined: user.date_joined,
            last_login: user.last_login,
        };
        Ok(Dashboard { user, account_info })
    }
}
