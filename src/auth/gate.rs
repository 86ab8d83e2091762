//! Request-boundary authorization.
//!
//! [`require_auth`] runs before any handler on protected routers and attaches a
//! [`RequestIdentity`] to the request extensions. Handlers read it back through
//! the [`AuthUser`] extractor. The identity is trusted as signed; nothing is
//! looked up in the database here.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::{claims::IdentityClaims, error::AuthError, jwt::TokenError, tokens::JwtKeys};

/// Identity resolved for the lifetime of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIdentity {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl From<IdentityClaims> for RequestIdentity {
    fn from(c: IdentityClaims) -> Self {
        Self {
            user_id: c.user_id,
            email: c.email,
            role: c.role,
        }
    }
}

impl RequestIdentity {
    /// The user id as a database key.
    pub fn user_uuid(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.user_id).map_err(|_| {
            debug!(user_id = %self.user_id, "token subject is not a uuid");
            AuthError::Forbidden(TokenError::Malformed)
        })
    }
}

/// Extracts `<token>` from `Authorization: <scheme> <token>`.
///
/// A missing or non-UTF-8 header, or an empty token segment, means no
/// credential was presented. A token under any other scheme is presented but
/// unusable.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::Unauthenticated)?
        .to_str()
        .map_err(|_| AuthError::Unauthenticated)?;
    let Some((scheme, token)) = value.trim().split_once(' ') else {
        return Err(AuthError::Unauthenticated);
    };
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Unauthenticated);
    }
    if !scheme.eq_ignore_ascii_case("bearer") {
        debug!(scheme, "unsupported authorization scheme");
        return Err(AuthError::Forbidden(TokenError::Malformed));
    }
    Ok(token)
}

/// Resolves the caller of a request: 401 without a credential, 403 when the
/// credential does not verify in the access domain.
pub fn authorize(headers: &HeaderMap, keys: &JwtKeys) -> Result<RequestIdentity, AuthError> {
    let token = bearer_token(headers)?;
    let claims = keys.verify_access(token).map_err(|e| match e {
        TokenError::Configuration | TokenError::LifetimeOutOfRange | TokenError::Encoding(_) => {
            AuthError::Configuration(e)
        }
        other => {
            debug!(reason = %other, "access credential rejected");
            AuthError::Forbidden(other)
        }
    })?;
    Ok(claims.into())
}

pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = authorize(req.headers(), &keys)?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// The authenticated caller. Reuses the identity attached by [`require_auth`]
/// and authorizes the request itself when used on an ungated route.
pub struct AuthUser(pub RequestIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<RequestIdentity>() {
            return Ok(AuthUser(identity.clone()));
        }
        let keys = JwtKeys::from_ref(state);
        let identity = authorize(&parts.headers, &keys)?;
        parts.extensions.insert(identity.clone());
        Ok(AuthUser(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tokens::tests::test_keys;
    use axum::{
        body::Body,
        http::{HeaderValue, StatusCode},
        middleware,
        routing::get,
        Json, Router,
    };
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use tower::ServiceExt;

    fn headers(auth: Option<&'static str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(v) = auth {
            h.insert(AUTHORIZATION, HeaderValue::from_static(v));
        }
        h
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        h
    }

    #[test]
    fn missing_or_empty_credential_is_unauthenticated() {
        let keys = test_keys();
        for h in [
            headers(None),
            headers(Some("Bearer")),
            headers(Some("Bearer   ")),
            headers(Some("")),
        ] {
            let err = authorize(&h, &keys).unwrap_err();
            assert!(matches!(err, AuthError::Unauthenticated), "{err:?}");
        }
    }

    #[test]
    fn other_scheme_with_token_is_forbidden() {
        let keys = test_keys();
        let pair = keys
            .issue_pair(&IdentityClaims::new("u1", "a@b.com"))
            .unwrap();
        let mut h = HeaderMap::new();
        h.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Token {}", pair.access_token)).unwrap(),
        );
        for h in [headers(Some("Basic dXNlcjpwYXNz")), h] {
            let err = authorize(&h, &keys).unwrap_err();
            assert!(matches!(err, AuthError::Forbidden(TokenError::Malformed)), "{err:?}");
        }
    }

    #[test]
    fn garbage_credential_is_forbidden() {
        let err = authorize(&headers(Some("Bearer garbage")), &test_keys()).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden(TokenError::Malformed)));
    }

    #[test]
    fn refresh_token_is_forbidden_at_gate() {
        let keys = test_keys();
        let pair = keys
            .issue_pair(&IdentityClaims::new("u1", "a@b.com"))
            .unwrap();
        let err = authorize(&bearer(&pair.refresh_token), &keys).unwrap_err();
        assert!(matches!(
            err,
            AuthError::Forbidden(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn issue_authorize_refresh_authorize() {
        let keys = test_keys();
        let pair = keys
            .issue_pair(&IdentityClaims::new("u1", "a@b.com"))
            .unwrap();

        let expected = RequestIdentity {
            user_id: "u1".into(),
            email: "a@b.com".into(),
            role: None,
        };
        assert_eq!(authorize(&bearer(&pair.access_token), &keys).unwrap(), expected);

        let fresh = keys.refresh_access(&pair.refresh_token).unwrap();
        assert_eq!(authorize(&bearer(&fresh), &keys).unwrap(), expected);
    }

    #[test]
    fn lowercase_scheme_is_accepted() {
        let keys = test_keys();
        let pair = keys
            .issue_pair(&IdentityClaims::new("u1", "a@b.com"))
            .unwrap();
        let mut h = HeaderMap::new();
        h.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("bearer {}", pair.access_token)).unwrap(),
        );
        assert_eq!(authorize(&h, &keys).unwrap().user_id, "u1");
    }

    #[test]
    fn non_uuid_subject_cannot_be_used_as_key() {
        let identity = RequestIdentity {
            user_id: "not-a-uuid".into(),
            email: "a@b.com".into(),
            role: None,
        };
        assert!(matches!(
            identity.user_uuid(),
            Err(AuthError::Forbidden(_))
        ));
    }

    fn gated_router(keys: JwtKeys, hits: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(move |AuthUser(identity): AuthUser| {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Json(identity)
                    }
                }),
            )
            .route_layer(middleware::from_fn_with_state(keys.clone(), require_auth))
            .with_state(keys)
    }

    async fn call(router: Router, auth: Option<String>) -> (StatusCode, serde_json::Value) {
        let mut req = axum::http::Request::builder().uri("/whoami");
        if let Some(a) = auth {
            req = req.header(AUTHORIZATION, a);
        }
        let res = router
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn gate_short_circuits_before_handler() {
        let keys = test_keys();
        let hits = Arc::new(AtomicUsize::new(0));

        let (status, body) = call(gated_router(keys.clone(), hits.clone()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "No token provided");

        let (status, body) = call(
            gated_router(keys.clone(), hits.clone()),
            Some("Bearer garbage".into()),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Invalid or expired token");

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn gate_attaches_identity_for_handler() {
        let keys = test_keys();
        let hits = Arc::new(AtomicUsize::new(0));
        let pair = keys
            .issue_pair(&IdentityClaims::new("u1", "a@b.com").with_role("admin"))
            .unwrap();

        let (status, body) = call(
            gated_router(keys, hits.clone()),
            Some(format!("Bearer {}", pair.access_token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({ "userId": "u1", "email": "a@b.com", "role": "admin" })
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn extractor_authorizes_on_ungated_route() {
        let keys = test_keys();
        let router = Router::new()
            .route(
                "/whoami",
                get(|AuthUser(identity): AuthUser| async move { Json(identity) }),
            )
            .with_state(keys.clone());

        let (status, body) = call(router.clone(), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "No token provided");

        let (status, _) = call(router.clone(), Some("Bearer garbage".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let pair = keys
            .issue_pair(&IdentityClaims::new("u2", "c@d.com"))
            .unwrap();
        let (status, body) = call(router, Some(format!("Bearer {}", pair.access_token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], "u2");
    }
}
