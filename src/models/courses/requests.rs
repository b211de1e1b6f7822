use serde::{Deserialize, Serialize};

/// 批量创建课程时的单条输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourse {
    pub code: String,
    pub name: String,
}

impl NewCourse {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}
