use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")
}

/// `?limit=&offset=` for listing routes. No limit means every row.
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: i64,
}

impl Pagination {
    /// Negative values are clamped to zero.
    pub fn normalized(self) -> (Option<i64>, i64) {
        (self.limit.map(|l| l.max(0)), self.offset.max(0))
    }
}
