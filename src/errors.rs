//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码、类型名称和调用方可映射的状态码。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - status_code() 方法 - 返回对应的 HTTP 状态码类别
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_ratings_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal, $status:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum RatingsError {
            $($variant(String),)*
        }

        impl RatingsError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(RatingsError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(RatingsError::$variant(_) => $type_name,)*
                }
            }

            /// 获取调用方应返回的状态码
            pub fn status_code(&self) -> u16 {
                match self {
                    $(RatingsError::$variant(_) => $status,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(RatingsError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl RatingsError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        RatingsError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_ratings_errors! {
    EmptyValue("E001", "Empty Value", 400),
    DuplicateKey("E002", "Duplicate Key", 409),
    ForeignKeyViolation("E003", "Foreign Key Violation", 409),
    AlreadyGraded("E004", "Already Graded", 403),
    NotFound("E005", "Resource Not Found", 404),
    OutOfRange("E006", "Value Out Of Range", 400),
    Internal("E007", "Internal Error", 500),
    DatabaseConfig("E008", "Database Configuration Error", 500),
    DatabaseConnection("E009", "Database Connection Error", 500),
    CacheConnection("E010", "Cache Connection Error", 500),
    CachePluginNotFound("E011", "Cache Plugin Not Found", 500),
}

impl RatingsError {
    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否为调用方可以预期并处理的业务错误
    pub fn is_expected(&self) -> bool {
        self.status_code() < 500
    }
}

impl fmt::Display for RatingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for RatingsError {}

// 未经分类的数据库错误一律视为内部错误，约束错误由各方言单独映射
impl From<sea_orm::DbErr> for RatingsError {
    fn from(err: sea_orm::DbErr) -> Self {
        RatingsError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RatingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(RatingsError::empty_value("test").code(), "E001");
        assert_eq!(RatingsError::already_graded("test").code(), "E004");
        assert_eq!(RatingsError::internal("test").code(), "E007");
        assert_eq!(RatingsError::cache_connection("test").code(), "E010");
        assert_eq!(RatingsError::cache_plugin_not_found("test").code(), "E011");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            RatingsError::foreign_key_violation("test").error_type(),
            "Foreign Key Violation"
        );
        assert_eq!(
            RatingsError::duplicate_key("test").error_type(),
            "Duplicate Key"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RatingsError::already_graded("x").status_code(), 403);
        assert_eq!(RatingsError::not_found("x").status_code(), 404);
        assert_eq!(RatingsError::internal("x").status_code(), 500);
        assert!(RatingsError::already_graded("x").is_expected());
        assert!(!RatingsError::database_connection("x").is_expected());
    }

    #[test]
    fn test_format_simple() {
        let err = RatingsError::empty_value("course code is blank");
        let formatted = err.format_simple();
        assert!(formatted.contains("Empty Value"));
        assert!(formatted.contains("course code is blank"));
    }

    #[test]
    fn test_db_err_is_internal() {
        let err: RatingsError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert_eq!(err.code(), "E007");
        assert!(err.message().contains("boom"));
    }
}
