//! Constants used throughout the Armory library.
//!
//! Cookie names, token lifetimes and pagination limits shared between the
//! library and the HTTP server.

/// Cookie carrying the short-lived access JWT.
pub const ACCESS_COOKIE: &str = "access_token";

/// Cookie carrying the long-lived refresh JWT.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Access token lifetime in seconds (60 minutes).
pub const ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Refresh token lifetime in seconds (7 days).
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Email verification token lifetime in seconds (24 hours).
pub const EMAIL_VERIFICATION_TTL_SECS: i64 = 24 * 60 * 60;

/// Password reset token lifetime in seconds (1 hour).
pub const PASSWORD_RESET_TTL_SECS: i64 = 60 * 60;

/// Resource key of the catalog-wide cache invalidation timestamp.
pub const GLOBAL_RESOURCE: &str = "global";

/// Page size used when a list query does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on the page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Minimum password length accepted on registration and reset.
pub const MIN_PASSWORD_LEN: usize = 8;
