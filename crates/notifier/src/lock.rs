//! Redis lock that keeps emission runs from overlapping.
//!
//! Acquired with `SET key token NX EX ttl`; released only by the holder of
//! `token` so a run that outlived its TTL cannot drop a newer run's lock.

use redis::aio::ConnectionManager;
use redis::Script;
use uuid::Uuid;

const LOCK_KEY: &str = "herald:emit_notices:lock";

const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// A held emission lock.
#[derive(Debug)]
pub struct EmitLock {
    token: String,
}

impl EmitLock {
    /// Try to take the lock. Returns `None` when another run holds it.
    pub async fn acquire(
        redis: &mut ConnectionManager,
        ttl_secs: u64,
    ) -> anyhow::Result<Option<Self>> {
        let token = Uuid::new_v4().to_string();

        let result: Option<String> = redis::cmd("SET")
            .arg(LOCK_KEY)
            .arg(&token)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs.max(1))
            .query_async(redis)
            .await?;

        Ok(result.map(|_| Self { token }))
    }

    /// Release the lock if it is still ours. Returns whether a key was deleted.
    pub async fn release(self, redis: &mut ConnectionManager) -> anyhow::Result<bool> {
        let deleted: i64 = Script::new(RELEASE_SCRIPT)
            .key(LOCK_KEY)
            .arg(&self.token)
            .invoke_async(redis)
            .await?;

        if deleted == 0 {
            tracing::warn!("Emit lock expired before release");
        }

        Ok(deleted > 0)
    }
}
