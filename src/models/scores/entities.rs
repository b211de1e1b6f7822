use serde::{Deserialize, Serialize};

/// 某位教师在某门课程上的聚合评分
///
/// 分数字段为 `None` 表示该组合尚无任何评分（序列化为 `null`），
/// 与“评分为 0”区分开。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub professor_uuid: String,
    pub professor_name: String,
    pub course_code: String,
    pub course_name: String,
    pub score_teaching: Option<f64>,
    pub score_coursework: Option<f64>,
    pub score_learning: Option<f64>,
    pub score_average: Option<f64>,
    // 实际评分次数（不含关联占位行）
    pub grade_count: i64,
    // 最近一次写入（评分或关联）的时间
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Score {
    /// 是否已有评分
    pub fn is_graded(&self) -> bool {
        self.grade_count > 0
    }
}
