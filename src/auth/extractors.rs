use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::{claims::Claims, jwt::JwtKeys};
use crate::error::AppError;

/// Verified caller identity, handed to handlers as a plain argument.
///
/// No bearer token → 401. A token that fails signature or expiry checks → 403.
/// Runs before any body extractor, so a rejected request never reaches the database.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AppError::Unauthorized)?;

        let keys = JwtKeys::from_ref(state);
        match keys.verify(token) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                Err(AppError::Forbidden)
            }
        }
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Json, Router};
    use tower::ServiceExt;

    async fn whoami(AuthUser(claims): AuthUser) -> Json<Claims> {
        Json(claims)
    }

    fn app(state: AppState) -> Router {
        Router::new().route("/whoami", get(whoami)).with_state(state)
    }

    async fn call(state: AppState, auth: Option<&str>) -> axum::response::Response {
        let mut req = Request::builder().uri("/whoami");
        if let Some(v) = auth {
            req = req.header(AUTHORIZATION, v);
        }
        app(state).oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let resp = call(AppState::fake(), None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn other_scheme_is_unauthorized() {
        let resp = call(AppState::fake(), Some("Basic dXNlcjpwdw==")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bad_token_is_forbidden() {
        let resp = call(AppState::fake(), Some("Bearer not-a-token")).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn token_from_other_secret_is_forbidden() {
        let other = JwtKeys::from_config(&crate::config::JwtConfig {
            secret: "someone-else".into(),
            ttl_hours: 20,
        });
        let token = other.sign(1, "a@x.com").unwrap();
        let resp = call(AppState::fake(), Some(&format!("Bearer {token}"))).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_claims() {
        let state = AppState::fake();
        let token = state.jwt.sign(7, "seven@x.com").unwrap();
        let resp = call(state, Some(&format!("Bearer {token}"))).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let claims: Claims = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.email, "seven@x.com");
    }
}
