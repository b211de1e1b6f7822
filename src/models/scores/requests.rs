/// 一次评分的三个维度：教学、课业、收获，取值范围 [0, 5]
pub type Grades = [f32; 3];

/// 评分维度的名称，与 `Grades` 下标一一对应
pub const GRADE_DIMENSIONS: [&str; 3] = ["teaching", "coursework", "learning"];
