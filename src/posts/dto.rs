use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// A post as stored and as returned to clients. The title travels as `namepost`,
/// the same name the create/update forms use.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "namepost")]
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields for an owner-scoped post update. `image: None` keeps the current image.
#[derive(Debug, Clone)]
pub struct PostUpdate {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPostResponse {
    pub message: &'static str,
    pub post_id: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
