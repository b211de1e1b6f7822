//! 缓存层
//!
//! - `ObjectCache`：键值缓存接口（Moka / Redis）
//! - `register`：缓存后端插件注册表
//! - `aside`：对存储只读方法的旁路缓存

pub mod aside;
pub mod object_cache;
pub mod register;

use async_trait::async_trait;

/// 缓存读取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    // 后端出错，调用方应回退到数据库
    ExistsButNoValue,
}

/// 键值缓存接口，值统一为 JSON 字符串
#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;
    /// ttl 为 0 时使用后端默认 TTL
    async fn insert_raw(&self, key: String, value: String, ttl: u64);
    async fn remove(&self, key: &str);
    async fn close(&self);
}

/// 声明缓存插件，生成 `register()` 供启动时注册
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:expr, $ty:ty) => {
        pub fn register() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(
                    |config: $crate::config::CacheConfig|
                     -> $crate::cache::register::BoxedObjectCacheFuture {
                        Box::pin(async move {
                            let cache = <$ty>::new(&config)
                                .map_err($crate::errors::RatingsError::cache_connection)?;
                            Ok::<_, $crate::errors::RatingsError>(
                                Box::new(cache) as Box<dyn $crate::cache::ObjectCache>
                            )
                        })
                    },
                ),
            );
        }
    };
}
