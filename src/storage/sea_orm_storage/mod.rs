//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite 与 PostgreSQL，两者只在方言上不同。

mod clock;
mod courses;
mod dialect;
mod professors;
mod scores;
mod search;

#[cfg(test)]
mod integration_tests;

pub use dialect::Dialect;

use crate::config::DatabaseConfig;
use crate::errors::{RatingsError, Result};
use clock::InsertClock;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
    pub(crate) dialect: Dialect,
    pub(crate) clock: Arc<InsertClock>,
}

impl SeaOrmStorage {
    /// 连接数据库并初始化表结构
    ///
    /// 表结构初始化失败时返回错误，调用方不应继续启动。
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db_url = Self::build_database_url(&config.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        let dialect = Dialect::from_backend(db.get_database_backend())?;

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| RatingsError::database_connection(format!("数据库迁移失败: {e}")))?;

        info!(
            "SeaORM 存储初始化完成，数据库: {} ({})",
            db_url,
            dialect.name()
        );

        Ok(Self {
            db,
            dialect,
            clock: Arc::new(InsertClock::default()),
        })
    }

    /// 当前使用的方言
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| RatingsError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("wal_autocheckpoint", "1000");

        // 内存数据库的每个连接都是独立的库，只能保留唯一一个常驻连接
        let in_memory = url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.pool_size.max(1))
                .min_connections(1)
                .idle_timeout(Duration::from_secs(300))
        };

        let pool = pool_options
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.timeout))
            .connect_with(opt)
            .await
            .map_err(|e| RatingsError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL）
    async fn connect_generic(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.pool_size.max(1))
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.timeout))
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false);

        Database::connect(opt)
            .await
            .map_err(|e| RatingsError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        let url = url.trim();
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(url.to_string())
        } else {
            Err(RatingsError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
use crate::models::{
    courses::{entities::Course, requests::NewCourse},
    professors::entities::Professor,
    scores::{entities::Score, requests::Grades},
};
use crate::storage::Storage;
use async_trait::async_trait;
use search::ScoreFilter;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 课程模块
    async fn add_course(&self, code: &str, name: &str) -> Result<Course> {
        self.add_course_impl(code, name).await
    }

    async fn add_course_many(&self, courses: Vec<NewCourse>) -> Result<Vec<Course>> {
        self.add_course_many_impl(courses).await
    }

    async fn remove_course(&self, code: &str, force_delete: bool) -> Result<()> {
        self.remove_course_impl(code, force_delete).await
    }

    async fn get_course(&self, code: &str) -> Result<Course> {
        self.get_course_impl(code).await
    }

    async fn get_last_courses(&self) -> Result<Vec<Course>> {
        self.get_last_courses_impl().await
    }

    // 教师模块
    async fn add_professor(&self, name: &str) -> Result<Professor> {
        self.add_professor_impl(name).await
    }

    async fn add_professor_many(&self, names: Vec<String>) -> Result<Vec<Professor>> {
        self.add_professor_many_impl(names).await
    }

    async fn remove_professor(&self, uuid: &str, force_delete: bool) -> Result<()> {
        self.remove_professor_impl(uuid, force_delete).await
    }

    async fn get_professor(&self, uuid: &str) -> Result<Professor> {
        self.get_professor_impl(uuid).await
    }

    async fn get_professor_uuid(&self, name: &str) -> Result<String> {
        self.get_professor_uuid_impl(name).await
    }

    async fn get_last_professors(&self) -> Result<Vec<Professor>> {
        self.get_last_professors_impl().await
    }

    // 评分模块
    async fn add_course_professor(&self, professor_uuid: &str, course_code: &str) -> Result<()> {
        self.add_course_professor_impl(professor_uuid, course_code)
            .await
    }

    async fn grade_course_professor(
        &self,
        professor_uuid: &str,
        course_code: &str,
        username: &str,
        grades: Grades,
    ) -> Result<()> {
        self.grade_course_professor_impl(professor_uuid, course_code, username, grades)
            .await
    }

    async fn get_last_scores(&self) -> Result<Vec<Score>> {
        self.find_scores(ScoreFilter::Recent).await
    }

    // 评分查询模块
    async fn get_scores_by_professor_uuid(&self, uuid: &str) -> Result<Vec<Score>> {
        self.find_scores(ScoreFilter::ProfessorUuid(uuid)).await
    }

    async fn get_scores_by_professor_name(&self, name: &str) -> Result<Vec<Score>> {
        self.find_scores(ScoreFilter::ProfessorName(name)).await
    }

    async fn get_scores_by_professor_name_like(&self, term: &str) -> Result<Vec<Score>> {
        self.find_scores(ScoreFilter::ProfessorNameLike(term)).await
    }

    async fn get_scores_by_course_code(&self, code: &str) -> Result<Vec<Score>> {
        self.find_scores(ScoreFilter::CourseCode(code)).await
    }

    async fn get_scores_by_course_code_like(&self, term: &str) -> Result<Vec<Score>> {
        self.find_scores(ScoreFilter::CourseCodeLike(term)).await
    }

    async fn get_scores_by_course_name(&self, name: &str) -> Result<Vec<Score>> {
        self.find_scores(ScoreFilter::CourseName(name)).await
    }

    async fn get_scores_by_course_name_like(&self, term: &str) -> Result<Vec<Score>> {
        self.find_scores(ScoreFilter::CourseNameLike(term)).await
    }
}
