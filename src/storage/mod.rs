use std::sync::Arc;

use crate::cache::aside::CachedStorage;
use crate::cache::ObjectCache;
use crate::config::{CacheConfig, DatabaseConfig};
use crate::models::{
    courses::{entities::Course, requests::NewCourse},
    professors::entities::Professor,
    scores::{entities::Score, requests::Grades},
};

use crate::errors::Result;

pub mod sea_orm_storage;

/// 评分存储接口
///
/// SQLite 与 PostgreSQL 共用这一接口，语义完全相同；所有多语句写操作在单个事务内完成。
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 课程管理方法
    // 创建课程
    async fn add_course(&self, code: &str, name: &str) -> Result<Course>;
    // 批量创建课程（全部成功或全部失败）
    async fn add_course_many(&self, courses: Vec<NewCourse>) -> Result<Vec<Course>>;
    // 删除课程，force 为 true 时连同评分一并删除
    async fn remove_course(&self, code: &str, force_delete: bool) -> Result<()>;
    // 通过课程代码获取课程
    async fn get_course(&self, code: &str) -> Result<Course>;
    // 最近创建的课程（最多 100 条）
    async fn get_last_courses(&self) -> Result<Vec<Course>>;

    /// 教师管理方法
    // 创建教师，生成 UUID
    async fn add_professor(&self, name: &str) -> Result<Professor>;
    // 批量创建教师（全部成功或全部失败）
    async fn add_professor_many(&self, names: Vec<String>) -> Result<Vec<Professor>>;
    // 删除教师，force 为 true 时连同评分一并删除
    async fn remove_professor(&self, uuid: &str, force_delete: bool) -> Result<()>;
    // 通过 UUID 获取教师
    async fn get_professor(&self, uuid: &str) -> Result<Professor>;
    // 通过姓名获取教师 UUID
    async fn get_professor_uuid(&self, name: &str) -> Result<String>;
    // 最近创建的教师（最多 100 条）
    async fn get_last_professors(&self) -> Result<Vec<Professor>>;

    /// 评分方法
    // 建立课程与教师的关联
    async fn add_course_professor(&self, professor_uuid: &str, course_code: &str) -> Result<()>;
    // 提交评分，同一用户对同一课程-教师组合只能评分一次
    async fn grade_course_professor(
        &self,
        professor_uuid: &str,
        course_code: &str,
        username: &str,
        grades: Grades,
    ) -> Result<()>;
    // 最近有变动的聚合评分（最多 100 条）
    async fn get_last_scores(&self) -> Result<Vec<Score>>;

    /// 评分查询方法（精确匹配不限条数，模糊匹配最多 100 条）
    async fn get_scores_by_professor_uuid(&self, uuid: &str) -> Result<Vec<Score>>;
    async fn get_scores_by_professor_name(&self, name: &str) -> Result<Vec<Score>>;
    async fn get_scores_by_professor_name_like(&self, term: &str) -> Result<Vec<Score>>;
    async fn get_scores_by_course_code(&self, code: &str) -> Result<Vec<Score>>;
    async fn get_scores_by_course_code_like(&self, term: &str) -> Result<Vec<Score>>;
    async fn get_scores_by_course_name(&self, name: &str) -> Result<Vec<Score>>;
    async fn get_scores_by_course_name_like(&self, term: &str) -> Result<Vec<Score>>;
}

/// 创建 SQL 存储（连接数据库并初始化表结构）
pub async fn create_storage(config: &DatabaseConfig) -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::connect(config).await?;
    Ok(Arc::new(storage))
}

/// 按缓存配置决定是否在存储外包一层旁路缓存
pub fn with_cache(
    storage: Arc<dyn Storage>,
    cache: Option<Arc<dyn ObjectCache>>,
    config: &CacheConfig,
) -> Arc<dyn Storage> {
    match cache {
        Some(cache) => Arc::new(CachedStorage::new(storage, cache, config.default_ttl)),
        None => storage,
    }
}
