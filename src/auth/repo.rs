use sqlx::PgPool;

use crate::auth::repo_types::{Credentials, NewUser};

impl Credentials {
    /// Find a user's credentials by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Credentials>> {
        let row = sqlx::query_as::<_, Credentials>(
            r#"
            SELECT id, email, password
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}

impl NewUser<'_> {
    /// Insert the user and return its id.
    pub async fn insert(&self, db: &PgPool) -> anyhow::Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (email, password, name, age, gender)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(self.email)
        .bind(self.password_hash)
        .bind(self.name)
        .bind(self.age)
        .bind(self.gender)
        .fetch_one(db)
        .await?;
        Ok(id)
    }
}
