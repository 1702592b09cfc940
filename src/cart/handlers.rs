use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{debug, info, instrument, warn};

use super::{
    dto::{AddToCartRequest, AddedToCartResponse, CartEntry},
    repo,
};
use crate::{
    auth::AuthUser,
    error::AppError,
    extractors::{ValidJson, ValidPath},
    state::AppState,
};

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(list_cart).post(add_to_cart))
        .route("/cart/:shirt_id", delete(remove_from_cart))
}

#[instrument(skip(state, claims, payload), fields(user_id = claims.id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidJson(payload): ValidJson<AddToCartRequest>,
) -> Result<(StatusCode, Json<AddedToCartResponse>), AppError> {
    let Some(shirt_id) = payload.shirt_id else {
        return Err(AppError::validation("กรุณาระบุ shirtId"));
    };

    let Some(cart_item_id) = repo::add(&state.db, claims.id, shirt_id).await? else {
        warn!(shirt_id, "shirt not found");
        return Err(AppError::not_found("ไม่พบเสื้อ"));
    };

    info!(shirt_id, cart_item_id, "added to cart");
    Ok((
        StatusCode::CREATED,
        Json(AddedToCartResponse {
            message: "เพิ่มสินค้าลงตะกร้าสำเร็จ",
            cart_item_id,
        }),
    ))
}

#[instrument(skip(state, claims), fields(user_id = claims.id))]
pub async fn list_cart(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<CartEntry>>, AppError> {
    Ok(Json(repo::list(&state.db, claims.id).await?))
}

/// Idempotent: removing a shirt that is not in the cart is still 204.
#[instrument(skip(state, claims), fields(user_id = claims.id))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidPath(shirt_id): ValidPath<i64>,
) -> Result<StatusCode, AppError> {
    let rows = repo::remove(&state.db, claims.id, shirt_id).await?;
    debug!(shirt_id, rows, "cart remove");
    Ok(StatusCode::NO_CONTENT)
}
