use anyhow::{Context, Result};
use sqlx::MySqlPool;

use crate::tracking::quota::DEFAULT_MONTHLY_LEAVE_LIMIT;

/// Primary key of the single settings row.
pub const SETTINGS_ROW_ID: u8 = 1;

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    let pool = MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    seed_settings(&pool).await?;

    Ok(pool)
}

/// Creates the settings row with the default leave limit, leaving an
/// existing row untouched.
async fn seed_settings(pool: &MySqlPool) -> Result<()> {
    sqlx::query("INSERT IGNORE INTO settings (id, monthly_leave_limit) VALUES (?, ?)")
        .bind(SETTINGS_ROW_ID)
        .bind(DEFAULT_MONTHLY_LEAVE_LIMIT)
        .execute(pool)
        .await
        .context("Failed to seed settings")?;
    Ok(())
}
