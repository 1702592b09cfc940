use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub shirt_id: Option<i64>,
}

/// One cart line joined with the shirt it points at.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub id: i64,
    pub shirt_id: i64,
    pub namepost: String,
    pub description: String,
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedToCartResponse {
    pub message: &'static str,
    pub cart_item_id: i64,
}
