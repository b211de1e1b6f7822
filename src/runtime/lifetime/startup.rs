use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::{AppConfig, CacheConfig};
use crate::errors::{RatingsError, Result};
use crate::storage::{self, Storage};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    /// 未启用缓存时为 None；退出前应调用 `close()`
    pub cache: Option<Arc<dyn ObjectCache>>,
}

impl StartupContext {
    /// 释放缓存资源
    pub async fn shutdown(&self) {
        if let Some(cache) = &self.cache {
            cache.close().await;
            debug!("Cache backend closed");
        }
    }
}

/// 按名称构造缓存后端
async fn build_cache(name: &str, config: &CacheConfig) -> Result<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name).ok_or_else(|| {
        RatingsError::cache_plugin_not_found(format!("Cache backend '{name}' not found in registry"))
    })?;
    let cache = constructor(config.clone()).await?;
    Ok(Arc::from(cache))
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache(config: &CacheConfig) -> Result<Arc<dyn ObjectCache>> {
    let cache_type = config.cache_type.as_str();

    warn!("Attempting to create {} cache backend", cache_type);

    match build_cache(cache_type, config).await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", cache_type);
            Ok(cache)
        }
        Err(e) if cache_type != "moka" => {
            warn!("Failed to create {} cache: {}", cache_type, e);
            warn!("Falling back to memory cache");
            let cache = build_cache("moka", config).await?;
            warn!("Successfully created fallback Moka (in-memory) cache backend");
            Ok(cache)
        }
        Err(e) => Err(e),
    }
}

/// 准备启动上下文
///
/// 存储与表结构初始化失败时直接返回错误；缓存失败只会降级为无缓存运行。
pub async fn prepare_startup(config: &AppConfig) -> Result<StartupContext> {
    // 已安装过时返回 Err，忽略即可
    let _ = rustls::crypto::ring::default_provider().install_default();

    crate::cache::register::register_builtin_plugins();
    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
        debug!("Debug mode: Cache registry is enabled");
    }

    let storage = storage::create_storage(&config.database).await?;
    warn!("Storage backend initialized and migrations completed");

    let cache = if config.cache.is_enabled() {
        match create_cache(&config.cache).await {
            Ok(cache) => {
                warn!("Cache backend initialized");
                Some(cache)
            }
            Err(e) => {
                warn!("No cache backend available, continuing without cache: {}", e);
                None
            }
        }
    } else {
        debug!("Cache disabled");
        None
    };

    let storage = storage::with_cache(storage, cache.clone(), &config.cache);

    Ok(StartupContext { storage, cache })
}
