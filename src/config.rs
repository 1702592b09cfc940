use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

/// Where uploaded images end up.
#[derive(Debug, Clone, Deserialize)]
pub enum StorageConfig {
    Local {
        root: String,
    },
    S3 {
        endpoint: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        region: String,
        public_url: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            ttl_hours: ttl_hours(env_parse("JWT_TTL_HOURS").unwrap_or(20))?,
        };

        let storage = match env_or("STORAGE_BACKEND", "local").as_str() {
            "local" => StorageConfig::Local {
                root: env_or("UPLOAD_DIR", "uploads"),
            },
            "s3" => {
                let endpoint = std::env::var("S3_ENDPOINT").context("S3_ENDPOINT must be set")?;
                let bucket = std::env::var("S3_BUCKET").context("S3_BUCKET must be set")?;
                let public_url = std::env::var("S3_PUBLIC_URL").unwrap_or_else(|_| {
                    format!("{}/{}", endpoint.trim_end_matches('/'), bucket)
                });
                StorageConfig::S3 {
                    access_key: std::env::var("S3_ACCESS_KEY")
                        .context("S3_ACCESS_KEY must be set")?,
                    secret_key: std::env::var("S3_SECRET_KEY")
                        .context("S3_SECRET_KEY must be set")?,
                    region: env_or("S3_REGION", "us-east-1"),
                    endpoint,
                    bucket,
                    public_url,
                }
            }
            other => anyhow::bail!("unknown STORAGE_BACKEND {other:?} (expected local or s3)"),
        };

        Ok(Self {
            database_url,
            max_connections: env_parse("DB_MAX_CONNECTIONS").unwrap_or(10),
            host: env_or("APP_HOST", "0.0.0.0"),
            port: env_parse("APP_PORT").unwrap_or(4000),
            jwt,
            storage,
        })
    }
}

/// Token lifetime must be between one hour and ten years.
pub const MAX_TTL_HOURS: i64 = 24 * 365 * 10;

fn ttl_hours(hours: i64) -> anyhow::Result<i64> {
    if !(1..=MAX_TTL_HOURS).contains(&hours) {
        anyhow::bail!("JWT_TTL_HOURS must be between 1 and {MAX_TTL_HOURS}, got {hours}");
    }
    Ok(hours)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
