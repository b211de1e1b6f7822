use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    // 课程代码（主键）
    pub code: String,
    // 课程名称
    pub name: String,
    // 创建时间
    pub created_at: chrono::DateTime<chrono::Utc>,
}
