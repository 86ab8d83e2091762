use std::{sync::Arc, time::Duration};

use axum::extract::FromRef;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::{
    claims::IdentityClaims,
    error::AuthError,
    jwt::{self, TokenError},
};
use crate::{config::JwtConfig, state::AppState};

/// One signing domain: its own secret and lifetime.
#[derive(Debug)]
struct SigningDomain {
    secret: String,
    ttl: Duration,
}

impl SigningDomain {
    fn new(secret: &str, ttl: Duration) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::Configuration);
        }
        if ttl.is_zero() || jwt::expiry_after(OffsetDateTime::now_utc(), ttl).is_none() {
            return Err(TokenError::LifetimeOutOfRange);
        }
        Ok(Self {
            secret: secret.to_owned(),
            ttl,
        })
    }
}

/// Access/refresh signing keys, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct JwtKeys {
    access: Arc<SigningDomain>,
    refresh: Arc<SigningDomain>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Result<Self, TokenError> {
        Ok(Self {
            access: Arc::new(SigningDomain::new(&cfg.secret, cfg.access_ttl)?),
            refresh: Arc::new(SigningDomain::new(&cfg.refresh_secret, cfg.refresh_ttl)?),
        })
    }

    /// Mints an access/refresh pair for the same identity.
    pub fn issue_pair(&self, identity: &IdentityClaims) -> Result<TokenPair, TokenError> {
        let access_token = jwt::sign(identity, &self.access.secret, self.access.ttl)?;
        let refresh_token = jwt::sign(identity, &self.refresh.secret, self.refresh.ttl)?;
        debug!(user_id = %identity.user_id, "token pair issued");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchanges a refresh credential for a fresh access credential.
    /// The refresh credential itself is never reissued.
    pub fn refresh_access(&self, refresh_token: &str) -> Result<String, AuthError> {
        let identity = jwt::verify(refresh_token, &self.refresh.secret).map_err(|e| {
            debug!(reason = %e, "refresh credential rejected");
            AuthError::InvalidRefresh(e)
        })?;
        jwt::sign(&identity, &self.access.secret, self.access.ttl).map_err(|e| {
            warn!(error = %e, "access token signing failed during refresh");
            AuthError::Configuration(e)
        })
    }

    /// Validates a credential in the access domain only.
    pub fn verify_access(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        jwt::verify(token, &self.access.secret)
    }
}
