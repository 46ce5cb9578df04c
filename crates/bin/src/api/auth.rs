//! Account routes, auth cookies and the current-user extractors.

use axum::{
    Json, Router,
    extract::{FromRequestParts, Query, State},
    http::{StatusCode, header, request::Parts},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_cookies::{
    Cookie, Cookies,
    cookie::{SameSite, time::Duration},
};

use armory::{
    constants::{ACCESS_COOKIE, REFRESH_COOKIE},
    user::{Dashboard, NewUser, PasswordChange, PasswordResetConfirm, TokenPair, User, UserError},
};

use super::{
    AppState,
    error::{ApiError, ApiResult},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/availability", get(availability))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
        .route("/auth/dashboard", get(dashboard))
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/verify-email/resend", post(resend_verification))
        .route("/auth/password/reset", post(request_password_reset))
        .route(
            "/auth/password/reset/confirm",
            get(check_reset_token).post(confirm_password_reset),
        )
        .route("/auth/password/change", post(change_password))
}

/// The signed-in user. Rejects the request with 401 when there is none.
pub struct CurrentUser(pub User);

/// The signed-in user, if any. Missing or invalid credentials yield `None`.
pub struct MaybeUser(pub Option<User>);

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

async fn access_token(parts: &mut Parts, state: &AppState) -> Option<String> {
    let from_cookie = Cookies::from_request_parts(parts, state)
        .await
        .ok()
        .and_then(|cookies| cookies.get(ACCESS_COOKIE).map(|c| c.value().to_string()));
    from_cookie.or_else(|| bearer_token(parts))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = access_token(parts, state)
            .await
            .ok_or_else(|| ApiError::from(armory::Error::from(UserError::NotAuthenticated)))?;
        let user = state.armory.users().user_from_access_token(&token).await?;
        Ok(CurrentUser(user))
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = access_token(parts, state).await else {
            return Ok(MaybeUser(None));
        };
        match state.armory.users().user_from_access_token(&token).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(err) if err.is_authentication_error() => Ok(MaybeUser(None)),
            Err(err) => Err(err.into()),
        }
    }
}

fn auth_cookie(
    name: &'static str,
    value: String,
    max_age_secs: i64,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

fn set_auth_cookies(cookies: &Cookies, state: &AppState, tokens: &TokenPair) {
    let auth = &state.armory.config().auth;
    cookies.add(auth_cookie(
        ACCESS_COOKIE,
        tokens.access.clone(),
        auth.access_ttl_secs,
        state.secure_cookies,
    ));
    cookies.add(auth_cookie(
        REFRESH_COOKIE,
        tokens.refresh.clone(),
        auth.refresh_ttl_secs,
        state.secure_cookies,
    ));
}

fn clear_auth_cookies(cookies: &Cookies) {
    for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
        cookies.remove(Cookie::build((name, "")).path("/").build());
    }
}

#[derive(Serialize)]
struct SessionResponse {
    user: User,
    #[serde(flatten)]
    tokens: TokenPair,
}

fn start_session(cookies: &Cookies, state: &AppState, user: User) -> ApiResult<SessionResponse> {
    let tokens = state.armory.users().issue_tokens(&user)?;
    set_auth_cookies(cookies, state, &tokens);
    Ok(SessionResponse { user, tokens })
}

/// POST /auth/register
async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(new_user): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let user = state.armory.users().register(new_user).await?;
    let session = start_session(&cookies, &state, user)?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[derive(Deserialize)]
struct AvailabilityQuery {
    username: Option<String>,
    email: Option<String>,
}

/// GET /auth/availability?username=&email=
async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<Json<Value>> {
    let users = state.armory.users();
    let mut body = serde_json::Map::new();
    if let Some(username) = &query.username {
        body.insert("username".into(), users.username_available(username).await?.into());
    }
    if let Some(email) = &query.email {
        body.insert("email".into(), users.email_available(email).await?.into());
    }
    Ok(Json(Value::Object(body)))
}

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(alias = "username", alias = "email")]
    login: String,
    password: String,
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let user = state
        .armory
        .users()
        .authenticate(&request.login, &request.password)
        .await?;
    tracing::info!(user_id = user.id, "User logged in");
    Ok(Json(start_session(&cookies, &state, user)?))
}

/// POST /auth/logout
async fn logout(cookies: Cookies) -> Json<Value> {
    clear_auth_cookies(&cookies);
    Json(json!({ "detail": "Successfully logged out." }))
}

#[derive(Default, Deserialize)]
struct RefreshRequest {
    refresh: Option<String>,
}

/// POST /auth/refresh
///
/// Reads the refresh cookie, or a `refresh` field in the body.
async fn refresh(
    State(state): State<AppState>,
    cookies: Cookies,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<Json<SessionResponse>> {
    let token = cookies
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|Json(b)| b.refresh))
        .ok_or_else(|| ApiError::from(armory::Error::from(UserError::NotAuthenticated)))?;

    let (user, tokens) = state.armory.users().refresh(&token).await?;
    set_auth_cookies(&cookies, &state, &tokens);
    Ok(Json(SessionResponse { user, tokens }))
}

/// GET /auth/me
async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// GET /auth/dashboard
async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Dashboard>> {
    Ok(Json(state.armory.users().dashboard(user.id).await?))
}

#[derive(Deserialize)]
struct VerifyEmailRequest {
    #[serde(alias = "token")]
    key: String,
}

/// POST /auth/verify-email
async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> ApiResult<Json<Value>> {
    let user = state.armory.users().verify_email(&request.key).await?;
    Ok(Json(json!({ "detail": "Email verified.", "user": user })))
}

/// POST /auth/verify-email/resend
async fn resend_verification(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    state.armory.users().resend_verification(user.id).await?;
    Ok(Json(json!({ "detail": "Verification email sent." })))
}

#[derive(Deserialize)]
struct PasswordResetRequest {
    email: String,
}

/// POST /auth/password/reset
async fn request_password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> ApiResult<Json<Value>> {
    state
        .armory
        .users()
        .request_password_reset(&request.email)
        .await?;
    Ok(Json(json!({ "detail": "Password reset email has been sent." })))
}

#[derive(Deserialize)]
struct TokenQuery {
    token: String,
}

/// GET /auth/password/reset/confirm?token=
async fn check_reset_token(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Json<Value>> {
    state.armory.users().check_reset_token(&query.token).await?;
    Ok(Json(json!({ "detail": "Token is valid." })))
}

/// POST /auth/password/reset/confirm
async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetConfirm>,
) -> ApiResult<Json<Value>> {
    state.armory.users().confirm_password_reset(request).await?;
    Ok(Json(json!({ "detail": "Password has been reset with the new password." })))
}

/// POST /auth/password/change
async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<PasswordChange>,
) -> ApiResult<Json<Value>> {
    state.armory.users().change_password(user.id, request).await?;
    Ok(Json(json!({ "detail": "New password has been saved." })))
}
