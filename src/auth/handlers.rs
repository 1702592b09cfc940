use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, RegisterResponse, TokenResponse},
        repo_types::{Credentials, NewUser},
        services::{hash_password, is_valid_email, normalize_email, verify_password, EMAIL_TAKEN},
    },
    error::{is_unique_violation, AppError},
    extractors::ValidJson,
    forms::non_blank,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let (Some(email), Some(password), Some(name)) = (
        non_blank(payload.email),
        payload.password.filter(|p| !p.is_empty()),
        non_blank(payload.name),
    ) else {
        return Err(AppError::validation(
            "กรุณากรอกอีเมล รหัสผ่าน และชื่อให้ครบถ้วน",
        ));
    };
    let email = normalize_email(&email);

    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::validation("รูปแบบอีเมลไม่ถูกต้อง"));
    }

    if Credentials::find_by_email(&state.db, &email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict(EMAIL_TAKEN.into()));
    }

    let hash = hash_password(password).await?;
    let gender = non_blank(payload.gender);
    let new_user = NewUser {
        email: &email,
        password_hash: &hash,
        name: &name,
        age: payload.age,
        gender: gender.as_deref(),
    };

    let id = match new_user.insert(&state.db).await {
        Ok(id) => id,
        // lost a race with a concurrent registration of the same email
        Err(e) if is_unique_violation(&e) => {
            warn!(%email, "email already registered");
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = id, %email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "ลงทะเบียนผู้ใช้สำเร็จ",
            id,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let (Some(email), Some(password)) = (non_blank(payload.email), payload.password) else {
        return Err(AppError::validation("กรุณากรอกอีเมลและรหัสผ่าน"));
    };
    let email = normalize_email(&email);

    let Some(user) = Credentials::find_by_email(&state.db, &email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::not_found("ไม่พบผู้ใช้"));
    };

    if !verify_password(password, user.password.clone()).await? {
        warn!(%email, user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials("รหัสผ่านไม่ถูกต้อง".into()));
    }

    let token = state.jwt.sign(user.id, &user.email)?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header::CONTENT_TYPE, Request};
    use tower::ServiceExt;

    async fn post_json(uri: &str, body: &str) -> axum::response::Response {
        auth_routes()
            .with_state(AppState::fake())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn register_without_name_is_rejected_before_db() {
        let resp = post_json("/register", r#"{"email":"a@x.com","password":"p"}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_with_blank_email_is_rejected() {
        let resp = post_json("/register", r#"{"email":"  ","password":"p","name":"A"}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_with_malformed_email_is_rejected() {
        let resp = post_json("/register", r#"{"email":"nope","password":"p","name":"A"}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_without_password_is_rejected() {
        let resp = post_json("/login", r#"{"email":"a@x.com"}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    async fn message_of(resp: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["message"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn register_with_string_age_is_a_json_400() {
        let resp = post_json(
            "/register",
            r#"{"email":"a@x.com","password":"p","name":"A","age":"30"}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(!message_of(resp).await.is_empty());
    }

    #[tokio::test]
    async fn login_without_content_type_is_a_json_400() {
        let resp = auth_routes()
            .with_state(AppState::fake())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .body(Body::from(r#"{"email":"a@x.com","password":"p"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(!message_of(resp).await.is_empty());
    }

    #[tokio::test]
    async fn login_with_broken_json_is_a_json_400() {
        let resp = post_json("/login", r#"{"email":"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(!message_of(resp).await.is_empty());
    }

    #[test]
    fn token_response_shape() {
        let json = serde_json::to_value(TokenResponse { token: "t".into() }).unwrap();
        assert_eq!(json, serde_json::json!({ "token": "t" }));
    }
}
