//! 幂等评分聚合
//!
//! 每个 (用户, 课程, 教师) 组合对应一个 64 位哈希，数据库中对该列的唯一约束
//! 是防止重复评分的唯一手段。聚合分数不单独存储，而是在读取时通过
//! `AVG() ... GROUP BY` 计算，这里只负责哈希、校验与舍入。

use xxhash_rust::xxh3::xxh3_64;

use crate::errors::{RatingsError, Result};
use crate::models::scores::requests::{GRADE_DIMENSIONS, Grades};

/// 计算评分去重哈希：`H(username ++ course_code ++ professor_uuid)`
///
/// 以 `i64` 形式返回（与 `u64` 按位相同），直接写入 BIGINT 列。
pub fn grade_hash(username: &str, course_code: &str, professor_uuid: &str) -> i64 {
    let mut buf =
        Vec::with_capacity(username.len() + course_code.len() + professor_uuid.len());
    buf.extend_from_slice(username.as_bytes());
    buf.extend_from_slice(course_code.as_bytes());
    buf.extend_from_slice(professor_uuid.as_bytes());
    xxh3_64(&buf) as i64
}

/// 校验三项分数并转换为存储类型
///
/// 只拒绝 NaN / 无穷大（SQLite 会把 NaN 存成 NULL）；
/// [0, 5] 区间由数据库 CHECK 约束负责。
pub fn prepare_grades(grades: &Grades) -> Result<[f64; 3]> {
    let mut out = [0.0; 3];
    for (i, grade) in grades.iter().enumerate() {
        if !grade.is_finite() {
            return Err(RatingsError::out_of_range(format!(
                "score_{} must be a finite number",
                GRADE_DIMENSIONS[i]
            )));
        }
        out[i] = f64::from(*grade);
    }
    Ok(out)
}

/// 保留两位小数，四舍五入（远离零）
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 由三个维度的 AVG() 结果得到的聚合分数
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aggregate {
    pub teaching: Option<f64>,
    pub coursework: Option<f64>,
    pub learning: Option<f64>,
    pub average: Option<f64>,
}

impl Aggregate {
    /// 任一维度为空（即没有实际评分）时，所有字段均为 `None`
    pub fn from_averages(
        teaching: Option<f64>,
        coursework: Option<f64>,
        learning: Option<f64>,
    ) -> Self {
        match (teaching, coursework, learning) {
            (Some(t), Some(c), Some(l)) => Self {
                teaching: Some(round2(t)),
                coursework: Some(round2(c)),
                learning: Some(round2(l)),
                average: Some(round2((t + c + l) / 3.0)),
            },
            _ => Self::default(),
        }
    }
}
