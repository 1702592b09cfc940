use sqlx::PgPool;

use super::dto::{Account, ProfileUpdate};
use crate::query::UpdateBuilder;

pub async fn find_account(db: &PgPool, user_id: i64) -> anyhow::Result<Option<Account>> {
    let row = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, name, picture, number, age, gender
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub(crate) fn profile_update(user_id: i64, p: ProfileUpdate) -> UpdateBuilder<'static> {
    UpdateBuilder::new("users")
        .set("name", p.name)
        .set("email", p.email)
        .set_opt("number", p.number)
        .set_opt("age", p.age)
        .set_opt("gender", p.gender)
        .set_opt("picture", p.picture)
        .scope("id", user_id)
}

/// Returns rows affected: 0 when the user no longer exists.
pub async fn update_profile(db: &PgPool, user_id: i64, p: ProfileUpdate) -> anyhow::Result<u64> {
    profile_update(user_id, p).execute(db).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_supplied_fields_are_assigned() {
        let sql = profile_update(
            5,
            ProfileUpdate {
                name: "A".into(),
                email: "a@x.com".into(),
                age: Some(30),
                ..Default::default()
            },
        )
        .sql()
        .unwrap();
        assert_eq!(
            sql,
            "UPDATE users SET name = $1, email = $2, age = $3 WHERE id = $4"
        );
    }

    #[test]
    fn picture_is_appended_last() {
        let sql = profile_update(
            5,
            ProfileUpdate {
                name: "A".into(),
                email: "a@x.com".into(),
                number: Some("0812345678".into()),
                picture: Some("/uploads/profiles/x.png".into()),
                ..Default::default()
            },
        )
        .sql()
        .unwrap();
        assert_eq!(
            sql,
            "UPDATE users SET name = $1, email = $2, number = $3, picture = $4 WHERE id = $5"
        );
    }
}
