//! 业务数据模型
//!
//! 与 `entity` 中的数据库实体分离，可序列化后放入缓存。

pub mod courses;
pub mod professors;
pub mod scores;

/// 列表类查询返回的最大行数
pub const MAX_LIST_ROWS: u64 = 100;
