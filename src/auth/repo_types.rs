use sqlx::FromRow;

/// Credentials row used by login.
#[derive(Debug, Clone, FromRow)]
pub struct Credentials {
    pub id: i64,
    pub email: String,
    pub password: String, // argon2 PHC string
}

/// Fields written on registration.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub age: Option<i32>,
    pub gender: Option<&'a str>,
}
