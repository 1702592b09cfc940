use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{Account, MessageResponse, ProfileUpdate},
    repo,
};
use crate::{
    auth::{
        services::{is_valid_email, normalize_email, EMAIL_TAKEN},
        AuthUser,
    },
    error::{is_unique_violation, AppError},
    forms::FormData,
    images::{discard_image, store_image, UPLOAD_LIMIT},
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/updateProfile",
            post(update_profile).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route("/account", get(account))
}

/// POST /updateProfile (multipart)
/// Fields: name, email (required); number, age, gender, profilePicture (optional).
#[instrument(skip(state, claims, form), fields(user_id = claims.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    mut form: FormData,
) -> Result<Json<MessageResponse>, AppError> {
    let (Some(name), Some(email)) = (form.text("name"), form.text("email")) else {
        return Err(AppError::validation("กรุณากรอกชื่อและอีเมลให้ครบถ้วน"));
    };
    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        return Err(AppError::validation("รูปแบบอีเมลไม่ถูกต้อง"));
    }
    let age = form.parsed::<i32>("age")?;

    let picture = match form.take_file("profilePicture") {
        Some(upload) => Some(store_image(state.storage.as_ref(), "profiles", upload).await?),
        None => None,
    };

    let update = ProfileUpdate {
        name,
        email,
        number: form.text("number"),
        age,
        gender: form.text("gender"),
        picture: picture.as_ref().map(|p| p.url.clone()),
    };

    let failure = match repo::update_profile(&state.db, claims.id, update).await {
        Ok(0) => AppError::not_found("ไม่พบผู้ใช้"),
        Ok(_) => {
            info!("profile updated");
            return Ok(Json(MessageResponse {
                message: "อัปเดตข้อมูลสำเร็จ",
            }));
        }
        Err(e) if is_unique_violation(&e) => {
            warn!("profile email already taken");
            AppError::Conflict(EMAIL_TAKEN.into())
        }
        Err(e) => e.into(),
    };
    discard_image(state.storage.as_ref(), picture).await;
    Err(failure)
}

#[instrument(skip(state, claims), fields(user_id = claims.id))]
pub async fn account(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Account>, AppError> {
    repo::find_account(&state.db, claims.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("ไม่พบผู้ใช้"))
}
