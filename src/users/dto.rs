use serde::Serialize;
use sqlx::FromRow;

/// `GET /account` body.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub number: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

/// Validated `POST /updateProfile` fields. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub number: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
