use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Professor {
    // 教师 UUID（v4，主键）
    pub uuid: String,
    // 教师姓名（唯一）
    pub name: String,
    // 创建时间
    pub created_at: chrono::DateTime<chrono::Utc>,
}
