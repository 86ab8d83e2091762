use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        claims::IdentityClaims,
        dto::{
            AuthResponse, LoginRequest, MessageResponse, PublicUser, RefreshRequest,
            RefreshResponse, RegisterRequest,
        },
        error::AuthError,
        password::{hash_password, verify_password, MIN_PASSWORD_LEN},
        tokens::JwtKeys,
    },
    error::ApiError,
    extract::ApiJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email address".into()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if state.users.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered"));
    }

    let hash = hash_password(&payload.password)?;
    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let user = state
        .users
        .create_account(&payload.email, &hash, name.as_deref())
        .await?;

    let identity = IdentityClaims::new(user.id.to_string(), user.email.clone());
    let tokens = match state.keys.issue_pair(&identity) {
        Ok(t) => t,
        Err(e) => {
            // No usable credentials means the account must not survive.
            error!(error = %e, user_id = %user.id, "token issuance failed, removing account");
            if let Err(cleanup) = state.users.delete_account(user.id).await {
                error!(error = %cleanup, user_id = %user.id, "account rollback failed");
            }
            return Err(AuthError::Configuration(e).into());
        }
    };

    info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: PublicUser {
                id: user.id,
                email: user.email,
                name,
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email address".into()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::Validation("Password is required".into()));
    }

    let Some(user) = state.users.find_by_email(&payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    // A missing profile does not block login.
    let name = match state.users.find_profile(user.id).await {
        Ok(profile) => profile.and_then(|p| p.name),
        Err(e) => {
            warn!(error = %e, user_id = %user.id, "profile lookup failed");
            None
        }
    };

    let identity = IdentityClaims::new(user.id.to_string(), user.email.clone());
    let tokens = state
        .keys
        .issue_pair(&identity)
        .map_err(AuthError::Configuration)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        message: "Login successful",
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user: PublicUser {
            id: user.id,
            email: user.email,
            name,
        },
    }))
}

#[instrument(skip(keys, payload))]
pub async fn refresh(
    State(keys): State<JwtKeys>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let token = payload.refresh_token.trim();
    if token.is_empty() {
        return Err(ApiError::Validation("Refresh token is required".into()));
    }

    let access_token = keys.refresh_access(token)?;
    Ok(Json(RefreshResponse {
        message: "Token refreshed successfully",
        access_token,
    }))
}

/// Tokens are stateless; the client discards them.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out successfully",
    })
}
