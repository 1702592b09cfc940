use sqlx::PgPool;

use super::dto::{Post, PostUpdate};
use crate::query::UpdateBuilder;

pub async fn insert(
    db: &PgPool,
    user_id: i64,
    title: &str,
    description: &str,
    image: Option<&str>,
) -> anyhow::Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO posts (user_id, title, description, image)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(title)
    .bind(description)
    .bind(image)
    .fetch_one(db)
    .await?;
    Ok(id)
}

/// `limit: None` binds NULL, which Postgres reads as no limit.
pub async fn list_by_user(
    db: &PgPool,
    user_id: i64,
    limit: Option<i64>,
    offset: i64,
) -> anyhow::Result<Vec<Post>> {
    let rows = sqlx::query_as::<_, Post>(
        r#"
        SELECT id, user_id, title, description, image, created_at
        FROM posts
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_all(db: &PgPool, limit: Option<i64>, offset: i64) -> anyhow::Result<Vec<Post>> {
    let rows = sqlx::query_as::<_, Post>(
        r#"
        SELECT id, user_id, title, description, image, created_at
        FROM posts
        ORDER BY created_at DESC, id DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub(crate) fn post_update(post_id: i64, user_id: i64, p: PostUpdate) -> UpdateBuilder<'static> {
    UpdateBuilder::new("posts")
        .set("title", p.title)
        .set("description", p.description)
        .set_opt("image", p.image)
        .scope("id", post_id)
        .scope("user_id", user_id)
}

/// Rows affected; 0 when the post is missing or belongs to someone else.
pub async fn update(db: &PgPool, post_id: i64, user_id: i64, p: PostUpdate) -> anyhow::Result<u64> {
    post_update(post_id, user_id, p).execute(db).await
}

pub(crate) const DELETE_OWNED: &str = "DELETE FROM posts WHERE id = $1 AND user_id = $2";

pub async fn delete(db: &PgPool, post_id: i64, user_id: i64) -> anyhow::Result<u64> {
    let done = sqlx::query(DELETE_OWNED)
        .bind(post_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(done.rows_affected())
}
