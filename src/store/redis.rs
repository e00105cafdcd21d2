//! Redis-backed [`KvStore`], shared by every process pointed at the same server.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::KvStore;
use crate::{RelayError, Result};

/// Increment, and set the expiry only when this increment created the key.
const INCR_WITH_TTL: &str = r"
local n = redis.call('INCR', KEYS[1])
if n == 1 then
  redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return n
";

/// [`KvStore`] over a multiplexed, auto-reconnecting redis connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    incr_script: redis::Script,
}

impl RedisStore {
    /// Connect to a redis server, e.g. `redis://127.0.0.1:6379/0`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(store_error)?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(store_error)?;
        Ok(Self {
            conn,
            incr_script: redis::Script::new(INCR_WITH_TTL),
        })
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(store_error)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl))
            .await
            .map_err(store_error)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(key).await.map_err(store_error)?;
        Ok(removed > 0)
    }

    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> Result<u64> {
        let mut conn = self.conn.clone();
        self.incr_script
            .key(key)
            .arg(ttl_secs(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(store_error)
    }
}

/// Redis expiries are whole seconds; round up and never go below one.
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

fn store_error(err: redis::RedisError) -> RelayError {
    RelayError::Store(err.to_string())
}
