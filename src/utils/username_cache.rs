use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// Usernames known to be taken. Only positives are stored; a miss means
/// "ask the database". Keys are lower-cased to match the column collation.
pub static USERNAME_CACHE: Lazy<Cache<String, ()>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

fn normalize(username: &str) -> String {
    username.trim().to_lowercase()
}

pub async fn mark_taken(username: &str) {
    USERNAME_CACHE.insert(normalize(username), ()).await;
}

/// Called when a user is renamed so the old name can be registered again.
pub async fn release(username: &str) {
    USERNAME_CACHE.invalidate(&normalize(username)).await;
}

pub async fn is_taken(username: &str) -> bool {
    USERNAME_CACHE.contains_key(&normalize(username))
}

async fn batch_mark(usernames: &[String]) {
    let futures: Vec<_> = usernames
        .iter()
        .map(|u| USERNAME_CACHE.insert(normalize(u), ()))
        .collect();

    futures::future::join_all(futures).await;
}

/// Loads usernames of users who logged in during the last `days` days.
pub async fn warmup_username_cache(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT username
        FROM users
        WHERE last_login_at >= NOW() - INTERVAL ? DAY
        ORDER BY last_login_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (username,) = row?;
        batch.push(username);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    log::info!(
        "Username cache warmup complete: {} recent users (last {} days)",
        total_count,
        days
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_mark_and_release() {
        mark_taken("  Cache_Test_User ").await;
        assert!(is_taken("cache_test_user").await);
        assert!(is_taken("CACHE_TEST_USER").await);

        release("cache_test_user").await;
        assert!(!is_taken("cache_test_user").await);
    }

    #[actix_web::test]
    async fn test_unknown_name_not_taken() {
        assert!(!is_taken("never-registered-name").await);
    }
}
