use sqlx::PgPool;

use super::dto::CartEntry;

/// Adds the shirt to the user's cart in one statement.
/// `None` when no post with that id exists.
pub async fn add(db: &PgPool, user_id: i64, shirt_id: i64) -> anyhow::Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO cart_items (user_id, post_id)
        SELECT $1, p.id
        FROM posts p
        WHERE p.id = $2
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(shirt_id)
    .fetch_optional(db)
    .await?;
    Ok(id)
}

pub async fn list(db: &PgPool, user_id: i64) -> anyhow::Result<Vec<CartEntry>> {
    let rows = sqlx::query_as::<_, CartEntry>(
        r#"
        SELECT c.id, c.post_id AS shirt_id, p.title AS namepost, p.description, p.image,
               c.created_at AS added_at
        FROM cart_items c
        JOIN posts p ON p.id = c.post_id
        WHERE c.user_id = $1
        ORDER BY c.created_at DESC, c.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub(crate) const REMOVE_SHIRT: &str = "DELETE FROM cart_items WHERE user_id = $1 AND post_id = $2";

/// Removes every entry of that shirt from the user's cart.
pub async fn remove(db: &PgPool, user_id: i64, shirt_id: i64) -> anyhow::Result<u64> {
    let done = sqlx::query(REMOVE_SHIRT)
        .bind(user_id)
        .bind(shirt_id)
        .execute(db)
        .await?;
    Ok(done.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_is_scoped_to_the_caller() {
        assert_eq!(
            REMOVE_SHIRT,
            "DELETE FROM cart_items WHERE user_id = $1 AND post_id = $2"
        );
    }
}
