//! Runtime configuration for an [`Armory`](crate::Armory) instance.

use url::Url;

use crate::constants::{
    ACCESS_TOKEN_TTL_SECS, EMAIL_VERIFICATION_TTL_SECS, PASSWORD_RESET_TTL_SECS,
    REFRESH_TOKEN_TTL_SECS,
};
use crate::sync::SyncPolicy;
use crate::{Error, Result};

/// Top-level configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub auth: AuthConfig,
    pub sync: SyncPolicy,
}

impl Config {
    /// Configuration with the given auth settings and the default sync policy.
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            auth,
            sync: SyncPolicy::default(),
        }
    }

    /// Replace the sync policy.
    pub fn with_sync(mut self, sync: SyncPolicy) -> Self {
        self.sync = sync;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.auth.validate()
    }
}

/// Token signing and account email settings.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC key for signing JWTs.
    pub jwt_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub verification_ttl_secs: i64,
    pub reset_ttl_secs: i64,
    /// Base URL of the web frontend; links in account emails point here.
    pub frontend_url: Url,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, frontend_url: Url) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_ttl_secs: ACCESS_TOKEN_TTL_SECS,
            refresh_ttl_secs: REFRESH_TOKEN_TTL_SECS,
            verification_ttl_secs: EMAIL_VERIFICATION_TTL_SECS,
            reset_ttl_secs: PASSWORD_RESET_TTL_SECS,
            frontend_url,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < 16 {
            return Err(Error::Config(
                "jwt secret must be at least 16 bytes".to_string(),
            ));
        }
        let ttls = [
            self.access_ttl_secs,
            self.refresh_ttl_secs,
            self.verification_ttl_secs,
            self.reset_ttl_secs,
        ];
        if ttls.iter().any(|ttl| *ttl <= 0) {
            return Err(Error::Config("token lifetimes must be positive".to_string()));
        }
        Ok(())
    }
}

// Keep the secret out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("verification_ttl_secs", &self.verification_ttl_secs)
            .field("reset_ttl_secs", &self.reset_ttl_secs)
            .field("frontend_url", &self.frontend_url.as_str())
            .finish()
    }
}
