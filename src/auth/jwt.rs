//! HS256 credential codec shared by the access and refresh domains.

use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::{IdentityClaims, TokenClaims};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret is not configured or is empty")]
    Configuration,
    #[error("credential is malformed")]
    Malformed,
    #[error("credential signature does not match")]
    InvalidSignature,
    #[error("credential has expired")]
    Expired,
    #[error("credential lifetime is out of range")]
    LifetimeOutOfRange,
    #[error("failed to encode credential: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

/// `now + ttl`, or `None` when the result is not a representable instant.
pub(crate) fn expiry_after(now: OffsetDateTime, ttl: Duration) -> Option<OffsetDateTime> {
    let secs = i64::try_from(ttl.as_secs()).ok()?;
    now.checked_add(TimeDuration::seconds(secs))
}

pub fn sign(claims: &IdentityClaims, secret: &str, ttl: Duration) -> Result<String, TokenError> {
    sign_at(claims, secret, ttl, OffsetDateTime::now_utc())
}

/// Signs `claims` as if issued at `now`; expiry is `now + ttl`.
pub fn sign_at(
    claims: &IdentityClaims,
    secret: &str,
    ttl: Duration,
    now: OffsetDateTime,
) -> Result<String, TokenError> {
    if secret.trim().is_empty() {
        return Err(TokenError::Configuration);
    }
    let exp = expiry_after(now, ttl).ok_or(TokenError::LifetimeOutOfRange)?;
    let payload = TokenClaims {
        identity: claims.clone(),
        iat: now.unix_timestamp(),
        exp: exp.unix_timestamp(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &payload,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::Encoding)?;
    debug!(user_id = %claims.user_id, exp = payload.exp, "jwt signed");
    Ok(token)
}

pub fn verify(token: &str, secret: &str) -> Result<IdentityClaims, TokenError> {
    verify_at(token, secret, OffsetDateTime::now_utc())
}

/// Verifies signature and structure, then checks expiry against `now`.
pub fn verify_at(
    token: &str,
    secret: &str,
    now: OffsetDateTime,
) -> Result<IdentityClaims, TokenError> {
    if secret.trim().is_empty() {
        return Err(TokenError::Configuration);
    }

    // Expiry is checked below against the injected clock, with no leeway.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;

    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    })?;

    if now.unix_timestamp() >= data.claims.exp {
        return Err(TokenError::Expired);
    }

    debug!(user_id = %data.claims.identity.user_id, "jwt verified");
    Ok(data.claims.identity)
}
