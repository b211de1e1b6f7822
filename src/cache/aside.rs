//! 旁路缓存（cache-aside）
//!
//! 只读方法先查缓存，未命中时查询数据库并异步写回缓存；写方法直接透传，
//! 不做任何失效处理，缓存数据的新鲜度只由 TTL 保证。

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::cache::{CacheResult, ObjectCache};
use crate::errors::Result;
use crate::models::{
    courses::{entities::Course, requests::NewCourse},
    professors::entities::Professor,
    scores::{entities::Score, requests::Grades},
};
use crate::storage::Storage;

/// 带旁路缓存的存储
pub struct CachedStorage {
    inner: Arc<dyn Storage>,
    cache: Arc<dyn ObjectCache>,
    ttl: u64,
}

impl CachedStorage {
    pub fn new(inner: Arc<dyn Storage>, cache: Arc<dyn ObjectCache>, ttl: u64) -> Self {
        Self { inner, cache, ttl }
    }

    /// 缓存键：方法名 + 参数
    fn key(method: &str, args: &[&str]) -> String {
        let mut key = String::from(method);
        for arg in args {
            key.push(':');
            key.push_str(arg);
        }
        key
    }

    async fn cached<T, F>(&self, key: String, load: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: Future<Output = Result<T>> + Send,
    {
        match self.cache.get_raw(&key).await {
            CacheResult::Found(json) => match serde_json::from_str::<T>(&json) {
                Ok(value) => {
                    debug!("Cache hit: {}", key);
                    return Ok(value);
                }
                Err(e) => {
                    warn!("Failed to deserialize cached value for {}: {}", key, e);
                    self.cache.remove(&key).await;
                }
            },
            CacheResult::NotFound => debug!("Cache miss: {}", key),
            CacheResult::ExistsButNoValue => debug!("Cache unavailable, reading through: {}", key),
        }

        let value = load.await?;

        match serde_json::to_string(&value) {
            Ok(json) => {
                let cache = Arc::clone(&self.cache);
                let ttl = self.ttl;
                tokio::spawn(async move {
                    cache.insert_raw(key, json, ttl).await;
                });
            }
            Err(e) => warn!("Failed to serialize value for cache key {}: {}", key, e),
        }

        Ok(value)
    }
}

#[async_trait]
impl Storage for CachedStorage {
    // 写操作直接透传
    async fn add_course(&self, code: &str, name: &str) -> Result<Course> {
        self.inner.add_course(code, name).await
    }

    async fn add_course_many(&self, courses: Vec<NewCourse>) -> Result<Vec<Course>> {
        self.inner.add_course_many(courses).await
    }

    async fn remove_course(&self, code: &str, force_delete: bool) -> Result<()> {
        self.inner.remove_course(code, force_delete).await
    }

    async fn add_professor(&self, name: &str) -> Result<Professor> {
        self.inner.add_professor(name).await
    }

    async fn add_professor_many(&self, names: Vec<String>) -> Result<Vec<Professor>> {
        self.inner.add_professor_many(names).await
    }

    async fn remove_professor(&self, uuid: &str, force_delete: bool) -> Result<()> {
        self.inner.remove_professor(uuid, force_delete).await
    }

    async fn add_course_professor(&self, professor_uuid: &str, course_code: &str) -> Result<()> {
        self.inner
            .add_course_professor(professor_uuid, course_code)
            .await
    }

    async fn grade_course_professor(
        &self,
        professor_uuid: &str,
        course_code: &str,
        username: &str,
        grades: Grades,
    ) -> Result<()> {
        self.inner
            .grade_course_professor(professor_uuid, course_code, username, grades)
            .await
    }

    // 读操作走缓存
    async fn get_course(&self, code: &str) -> Result<Course> {
        self.cached(Self::key("course", &[code]), self.inner.get_course(code))
            .await
    }

    async fn get_last_courses(&self) -> Result<Vec<Course>> {
        self.cached(Self::key("courses:last", &[]), self.inner.get_last_courses())
            .await
    }

    async fn get_professor(&self, uuid: &str) -> Result<Professor> {
        self.cached(Self::key("professor", &[uuid]), self.inner.get_professor(uuid))
            .await
    }

    async fn get_professor_uuid(&self, name: &str) -> Result<String> {
        self.cached(
            Self::key("professor:uuid", &[name]),
            self.inner.get_professor_uuid(name),
        )
        .await
    }

    async fn get_last_professors(&self) -> Result<Vec<Professor>> {
        self.cached(
            Self::key("professors:last", &[]),
            self.inner.get_last_professors(),
        )
        .await
    }

    async fn get_last_scores(&self) -> Result<Vec<Score>> {
        self.cached(Self::key("scores:last", &[]), self.inner.get_last_scores())
            .await
    }

    async fn get_scores_by_professor_uuid(&self, uuid: &str) -> Result<Vec<Score>> {
        self.cached(
            Self::key("scores:by_professor_uuid", &[uuid]),
            self.inner.get_scores_by_professor_uuid(uuid),
        )
        .await
    }

    async fn get_scores_by_professor_name(&self, name: &str) -> Result<Vec<Score>> {
        self.cached(
            Self::key("scores:by_professor_name", &[name]),
            self.inner.get_scores_by_professor_name(name),
        )
        .await
    }

    async fn get_scores_by_professor_name_like(&self, term: &str) -> Result<Vec<Score>> {
        self.cached(
            Self::key("scores:by_professor_name_like", &[term]),
            self.inner.get_scores_by_professor_name_like(term),
        )
        .await
    }

    async fn get_scores_by_course_code(&self, code: &str) -> Result<Vec<Score>> {
        self.cached(
            Self::key("scores:by_course_code", &[code]),
            self.inner.get_scores_by_course_code(code),
        )
        .await
    }

    async fn get_scores_by_course_code_like(&self, term: &str) -> Result<Vec<Score>> {
        self.cached(
            Self::key("scores:by_course_code_like", &[term]),
            self.inner.get_scores_by_course_code_like(term),
        )
        .await
    }

    async fn get_scores_by_course_name(&self, name: &str) -> Result<Vec<Score>> {
        self.cached(
            Self::key("scores:by_course_name", &[name]),
            self.inner.get_scores_by_course_name(name),
        )
        .await
    }

    async fn get_scores_by_course_name_like(&self, term: &str) -> Result<Vec<Score>> {
        self.cached(
            Self::key("scores:by_course_name_like", &[term]),
            self.inner.get_scores_by_course_name_like(term),
        )
        .await
    }
}
