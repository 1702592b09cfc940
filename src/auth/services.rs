use lazy_static::lazy_static;
use regex::Regex;

use super::password;

pub const EMAIL_TAKEN: &str = "Email นี้ถูกใช้ไปแล้ว";

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Argon2 is deliberately slow; keep it off the async workers.
pub async fn hash_password(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || password::hash(&plain)).await?
}

pub async fn verify_password(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || password::verify(&plain, &hash)).await?
}
