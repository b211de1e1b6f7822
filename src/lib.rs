//! 课程与教师评分的持久化与聚合引擎
//!
//! 同一套存储接口同时支持 SQLite 与 PostgreSQL，评分以 (用户, 课程, 教师)
//! 哈希去重，聚合分数在读取时计算。
//!
//! # 架构
//! - `cache`: 缓存层（Moka/Redis）与旁路缓存
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `grading`: 评分哈希、校验与舍入
//! - `models`: 数据模型定义
//! - `runtime`: 运行时生命周期管理
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数

pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod grading;
pub mod models;
pub mod runtime;
pub mod storage;
pub mod utils;
