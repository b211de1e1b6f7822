use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use std::sync::Mutex;
use tracing::{debug, error};

use crate::cache::{CacheResult, ObjectCache};
use crate::config::CacheConfig;
use crate::declare_object_cache_plugin;

declare_object_cache_plugin!("redis", RedisObjectCache);

/// Redis 缓存，所有键带统一前缀，复用同一条多路复用连接
pub struct RedisObjectCache {
    client: redis::Client,
    conn: Mutex<Option<MultiplexedConnection>>,
    key_prefix: String,
    default_ttl: u64,
}

impl RedisObjectCache {
    /// 创建时同步 PING 一次，服务不可达直接报错，由启动流程回退到内存缓存
    pub fn new(config: &CacheConfig) -> Result<Self, String> {
        let redis = &config.redis;

        let client = redis::Client::open(redis.url.as_str())
            .map_err(|e| format!("Invalid Redis URL '{}': {e}", redis.url))?;

        let mut probe = client
            .get_connection()
            .map_err(|e| format!("Redis connection failed ({}): {e}", redis.url))?;
        let pong: String = redis::cmd("PING")
            .query(&mut probe)
            .map_err(|e| format!("Redis ping failed ({}): {e}", redis.url))?;
        debug!(
            "Redis reachable ({}), prefix '{}', TTL {}s",
            pong, redis.key_prefix, config.default_ttl
        );

        Ok(Self {
            client,
            conn: Mutex::new(None),
            key_prefix: redis.key_prefix.clone(),
            default_ttl: config.default_ttl,
        })
    }

    /// 取得共享连接，首次调用时建立；失败时返回 None 并记录日志
    async fn connection(&self) -> Option<MultiplexedConnection> {
        let cached = self
            .conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        if cached.is_some() {
            return cached;
        }

        match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => {
                *self
                    .conn
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(conn.clone());
                Some(conn)
            }
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                None
            }
        }
    }

    /// 命令出错后丢弃连接，下次重新建立
    fn reset_connection(&self) {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    fn effective_ttl(&self, ttl: u64) -> u64 {
        if ttl == 0 { self.default_ttl } else { ttl }
    }
}

#[async_trait]
impl ObjectCache for RedisObjectCache {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        let Some(mut conn) = self.connection().await else {
            return CacheResult::ExistsButNoValue;
        };

        match conn.get::<_, Option<String>>(self.make_key(key)).await {
            Ok(Some(data)) => CacheResult::Found(data),
            Ok(None) => CacheResult::NotFound,
            Err(e) => {
                error!("Failed to get key '{}': {}", key, e);
                self.reset_connection();
                CacheResult::ExistsButNoValue
            }
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let Some(mut conn) = self.connection().await else {
            return;
        };

        let ttl = self.effective_ttl(ttl);
        if let Err(e) = conn
            .set_ex::<_, _, ()>(self.make_key(&key), value, ttl)
            .await
        {
            error!("Failed to insert key '{}' into cache: {}", key, e);
            self.reset_connection();
        } else {
            debug!("Cached {} for {}s", key, ttl);
        }
    }

    async fn remove(&self, key: &str) {
        let Some(mut conn) = self.connection().await else {
            return;
        };

        if let Err(e) = conn.del::<_, i64>(self.make_key(key)).await {
            error!("Failed to remove key '{}': {}", key, e);
            self.reset_connection();
        }
    }

    async fn close(&self) {
        self.reset_connection();
        debug!("RedisObjectCache closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = CacheConfig::default();
        config.redis.url = "not a redis url".to_string();
        assert!(RedisObjectCache::new(&config).is_err());
    }

    #[test]
    fn test_unreachable_server_rejected() {
        let mut config = CacheConfig::default();
        config.redis.url = "redis://127.0.0.1:1".to_string();
        assert!(RedisObjectCache::new(&config).is_err());
    }
}
