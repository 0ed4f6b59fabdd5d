use async_trait::async_trait;
use color_eyre::Result;
use common_types::NewViolation;
use sqlx::PgPool;

/// Where finished violation rows go. The orchestrator only needs inserts;
/// failures are logged by the caller, never retried.
#[async_trait]
pub trait ViolationSink: Send + Sync {
    async fn insert(&self, violation: &NewViolation) -> Result<()>;
}

/// PostgreSQL-backed sink writing to the `violations` table.
#[derive(Clone)]
pub struct ViolationStore {
    pool: PgPool,
}

impl ViolationStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ViolationSink for ViolationStore {
    async fn insert(&self, violation: &NewViolation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO violations (camera_id, plate_text, confidence, plate_url, scene_url, timestamp, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&violation.camera_id)
        .bind(&violation.plate_text)
        .bind(violation.confidence)
        .bind(&violation.plate_url)
        .bind(&violation.scene_url)
        .bind(violation.timestamp)
        .bind(violation.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
