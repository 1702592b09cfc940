use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

/// Salted argon2id PHC string for a plain password.
pub fn hash(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| anyhow::anyhow!("argon2 hashing failed: {e}"))
}

/// `Ok(false)` for a wrong password; `Err` only when the stored hash is unusable.
pub fn verify(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let phc = PasswordHash::new(stored)
        .map_err(|e| anyhow::anyhow!("stored password hash is not a PHC string: {e}"))?;
    match Argon2::default().verify_password(plain.as_bytes(), &phc) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("argon2 verification failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_form_is_salted_phc() {
        let first = hash("p").unwrap();
        let second = hash("p").unwrap();
        assert!(first.starts_with("$argon2id$"));
        assert!(!first.contains("$p$"));
        assert_ne!(first, second, "each hash gets its own salt");
    }

    #[test]
    fn matching_and_mismatching_passwords() {
        let stored = hash("รหัสลับ-123").unwrap();
        assert!(verify("รหัสลับ-123", &stored).unwrap());
        assert!(!verify("รหัสลับ-124", &stored).unwrap());
        assert!(!verify("", &stored).unwrap());
    }

    #[test]
    fn unusable_stored_hash_is_an_error() {
        assert!(verify("anything", "plaintext-password").is_err());
        assert!(verify("anything", "").is_err());
    }
}
