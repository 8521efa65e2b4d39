use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::db::SETTINGS_ROW_ID;
use crate::error::ApiError;
use crate::tracking::quota::{LeaveQuotaConfig, effective_limit};

/// Longest time a limit written by another process can go unseen.
pub const LIMIT_TTL: Duration = Duration::from_secs(60);

/// Single-entry cache of the monthly leave limit. Local writes invalidate it.
static LEAVE_LIMIT: Lazy<Cache<(), u32>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(1)
        .time_to_live(LIMIT_TTL)
        .build()
});

async fn load(pool: &MySqlPool) -> Result<u32, sqlx::Error> {
    let config = sqlx::query_as::<_, LeaveQuotaConfig>(
        "SELECT monthly_leave_limit FROM settings WHERE id = ?",
    )
    .bind(SETTINGS_ROW_ID)
    .fetch_optional(pool)
    .await?;

    Ok(effective_limit(config.as_ref()))
}

pub async fn monthly_limit(pool: &MySqlPool) -> Result<u32, ApiError> {
    LEAVE_LIMIT.try_get_with((), load(pool)).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to load leave limit");
        ApiError::Internal
    })
}

/// Writes the limit and drops the cached value.
pub async fn set_monthly_limit(pool: &MySqlPool, limit: u32) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        INSERT INTO settings (id, monthly_leave_limit) VALUES (?, ?)
        ON DUPLICATE KEY UPDATE monthly_leave_limit = VALUES(monthly_leave_limit)
        "#,
    )
    .bind(SETTINGS_ROW_ID)
    .bind(limit)
    .execute(pool)
    .await
    .map_err(ApiError::db("Failed to update leave limit"))?;

    LEAVE_LIMIT.invalidate(&()).await;
    Ok(())
}
