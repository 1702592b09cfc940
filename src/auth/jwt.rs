use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::Claims;
use crate::config::JwtConfig;

/// HS256 signing and verification keys.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: TimeDuration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: TimeDuration::seconds(cfg.ttl_hours.max(0).saturating_mul(3600)),
        }
    }

    pub fn sign(&self, user_id: i64, email: &str) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now
            .checked_add(self.ttl)
            .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?;
        let claims = Claims {
            id: user_id,
            email: email.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> anyhow::Result<String> {
        let token = encode(&Header::default(), claims, &self.encoding)?;
        debug!(user_id = claims.id, "jwt signed");
        Ok(token)
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        debug!(user_id = data.claims.id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            ttl_hours: 20,
        })
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(42, "a@x.com").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.id, 42);
        assert_eq!(claims.email, "a@x.com");
    }

    #[test]
    fn token_lives_twenty_hours() {
        let keys = make_keys("dev-secret");
        let claims = keys.verify(&keys.sign(1, "a@x.com").unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, 20 * 60 * 60);
    }

    #[test]
    fn verify_rejects_other_secret() {
        let token = make_keys("secret-a").sign(1, "a@x.com").unwrap();
        assert!(make_keys("secret-b").verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let token = keys
            .encode(&Claims {
                id: 1,
                email: "a@x.com".into(),
                iat: now - 3 * 3600,
                exp: now - 3600,
            })
            .unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn huge_ttl_does_not_overflow() {
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "dev-secret".into(),
            ttl_hours: i64::MAX,
        });
        assert!(keys.sign(1, "a@x.com").is_err());

        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "dev-secret".into(),
            ttl_hours: -5,
        });
        assert_eq!(keys.ttl, TimeDuration::ZERO);
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(make_keys("dev-secret").verify("not.a.jwt").is_err());
    }
}
