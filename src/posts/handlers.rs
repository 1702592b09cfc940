use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{debug, info, instrument};

use super::{
    dto::{CreatedPostResponse, MessageResponse, Post, PostUpdate},
    repo,
};
use crate::{
    auth::AuthUser,
    db::Pagination,
    error::AppError,
    extractors::{ValidPath, ValidQuery},
    forms::FormData,
    images::{discard_image, store_image, StoredImage, UPLOAD_LIMIT},
    state::AppState,
};

const MISSING_FIELDS: &str = "กรุณากรอกชื่อโพสต์และรายละเอียดให้ครบถ้วน";

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", put(update_post).delete(delete_post))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
}

pub fn shirt_routes() -> Router<AppState> {
    Router::new().route("/shirts", get(list_shirts))
}

/// Title, description and optional stored image from a post form.
async fn read_post_form(
    state: &AppState,
    mut form: FormData,
) -> Result<(String, String, Option<StoredImage>), AppError> {
    let (Some(title), Some(description)) = (form.text("namepost"), form.text("description")) else {
        return Err(AppError::validation(MISSING_FIELDS));
    };
    let image = match form.take_file("image") {
        Some(upload) => Some(store_image(state.storage.as_ref(), "posts", upload).await?),
        None => None,
    };
    Ok((title, description, image))
}

/// POST /posts (multipart): namepost, description, image?
#[instrument(skip(state, claims, form), fields(user_id = claims.id))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    form: FormData,
) -> Result<(StatusCode, Json<CreatedPostResponse>), AppError> {
    let (title, description, image) = read_post_form(&state, form).await?;
    let url = image.as_ref().map(|i| i.url.as_str());
    let post_id = match repo::insert(&state.db, claims.id, &title, &description, url).await {
        Ok(id) => id,
        Err(e) => {
            discard_image(state.storage.as_ref(), image).await;
            return Err(e.into());
        }
    };

    info!(post_id, "post created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedPostResponse {
            message: "สร้างโพสต์สำเร็จ",
            post_id,
        }),
    ))
}

#[instrument(skip(state, claims), fields(user_id = claims.id))]
pub async fn list_posts(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidQuery(page): ValidQuery<Pagination>,
) -> Result<Json<Vec<Post>>, AppError> {
    let (limit, offset) = page.normalized();
    let posts = repo::list_by_user(&state.db, claims.id, limit, offset).await?;
    Ok(Json(posts))
}

/// PUT /posts/:id (multipart): namepost, description, image?
/// Someone else's post is left untouched and still answered with 200.
#[instrument(skip(state, claims, form), fields(user_id = claims.id))]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidPath(id): ValidPath<i64>,
    form: FormData,
) -> Result<Json<MessageResponse>, AppError> {
    let (title, description, image) = read_post_form(&state, form).await?;
    let changes = PostUpdate {
        title,
        description,
        image: image.as_ref().map(|i| i.url.clone()),
    };

    match repo::update(&state.db, id, claims.id, changes).await {
        Ok(0) => {
            debug!(post_id = id, "update matched no owned post");
            discard_image(state.storage.as_ref(), image).await;
        }
        Ok(_) => info!(post_id = id, "post updated"),
        Err(e) => {
            discard_image(state.storage.as_ref(), image).await;
            return Err(e.into());
        }
    }
    Ok(Json(MessageResponse {
        message: "อัปเดตโพสต์สำเร็จ",
    }))
}

#[instrument(skip(state, claims), fields(user_id = claims.id))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, AppError> {
    let rows = repo::delete(&state.db, id, claims.id).await?;
    debug!(post_id = id, rows, "post delete");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /shirts: every post, no auth.
#[instrument(skip(state))]
pub async fn list_shirts(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<Pagination>,
) -> Result<Json<Vec<Post>>, AppError> {
    let (limit, offset) = page.normalized();
    let posts = repo::list_all(&state.db, limit, offset).await?;
    Ok(Json(posts))
}
