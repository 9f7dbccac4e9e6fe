//! Redis service for cross-instance generation locks

use redis::{Client, Script};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
end
return 0
"#;

#[derive(Clone)]
pub struct RedisService {
    client: Client,
    lock_ttl_ms: u64,
}

/// Locks held by one generation run
#[derive(Debug)]
pub struct GenerationLock {
    keys: Vec<String>,
    token: String,
}

impl RedisService {
    /// Create a new Redis service
    pub async fn new(url: &str, lock_ttl_secs: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self {
            client,
            lock_ttl_ms: lock_ttl_secs.max(1) * 1000,
        })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }

    /// Take the generation lock of every barber, in sorted order.
    ///
    /// Fails with a conflict if another instance holds any of them; locks
    /// taken so far are released first.
    pub async fn acquire_generation_lock(&self, barbers: &[String]) -> AppResult<GenerationLock> {
        let mut keys: Vec<String> = barbers.iter().map(|b| format!("generation:lock:{}", b)).collect();
        keys.sort();
        keys.dedup();

        let token = Uuid::new_v4().to_string();
        let mut conn = self.connection().await?;
        let mut held = GenerationLock { keys: Vec::new(), token };

        for key in keys {
            let acquired: Option<String> = redis::cmd("SET")
                .arg(&key)
                .arg(&held.token)
                .arg("NX")
                .arg("PX")
                .arg(self.lock_ttl_ms)
                .query_async(&mut conn)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to take generation lock: {}", e)))?;

            if acquired.is_none() {
                self.release(held).await?;
                return Err(AppError::Conflict(
                    "Another generation run is in progress".to_string(),
                ));
            }
            held.keys.push(key);
        }

        Ok(held)
    }

    /// Release locks still owned by this run
    pub async fn release(&self, lock: GenerationLock) -> AppResult<()> {
        if lock.keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        let script = Script::new(RELEASE_SCRIPT);
        for key in &lock.keys {
            let _: i64 = script
                .key(key)
                .arg(&lock.token)
                .invoke_async(&mut conn)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to release generation lock: {}", e)))?;
        }
        Ok(())
    }
}
