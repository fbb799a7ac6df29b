pub mod calculations;

use crate::domain::calculation::{CalculationRecord, StoredCalculation};
use anyhow::Context;
use uuid::Uuid;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

/// Append-only persistence for calculation records.
#[async_trait::async_trait]
pub trait CalculationStore: Send + Sync {
    async fn create(&self, record: &CalculationRecord) -> anyhow::Result<StoredCalculation>;

    /// Newest first.
    async fn list(&self, limit: i64) -> anyhow::Result<Vec<CalculationRecord>>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<CalculationRecord>>;
}
