//! SQL 方言差异
//!
//! 两种引擎的数据模型与约束完全一致，这里只处理：
//! - 参数占位符写法
//! - 大小写折叠（两边都只折叠 ASCII 字母）
//! - 约束冲突错误码到 `RatingsError` 的映射

use sea_orm::{DatabaseBackend, DbErr, RuntimeErr, SqlErr};

use crate::errors::{RatingsError, Result};

/// 支持的数据库方言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

/// 约束冲突的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintKind {
    Unique,
    ForeignKey,
    Check,
}

impl Dialect {
    pub fn from_backend(backend: DatabaseBackend) -> Result<Self> {
        match backend {
            DatabaseBackend::Sqlite => Ok(Dialect::Sqlite),
            DatabaseBackend::Postgres => Ok(Dialect::Postgres),
            other => Err(RatingsError::database_config(format!(
                "不支持的数据库类型: {other:?}"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        }
    }

    /// 第 n 个（从 1 开始）参数占位符
    pub fn param(self, n: usize) -> String {
        match self {
            Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${n}"),
        }
    }

    /// 不区分大小写比较时使用的折叠表达式
    ///
    /// SQLite 的 LOWER() 只处理 ASCII，PostgreSQL 在 "C" 排序规则下同样只处理 ASCII。
    pub fn fold_case(self, expr: &str) -> String {
        match self {
            Dialect::Sqlite => format!("LOWER({expr})"),
            Dialect::Postgres => format!("LOWER({expr} COLLATE \"C\")"),
        }
    }

    /// 引擎错误码到约束种类的映射
    fn constraint_kind(self, code: &str) -> Option<ConstraintKind> {
        match self {
            // SQLite 扩展错误码
            Dialect::Sqlite => match code {
                "2067" | "1555" => Some(ConstraintKind::Unique),
                "787" => Some(ConstraintKind::ForeignKey),
                "275" => Some(ConstraintKind::Check),
                _ => None,
            },
            // PostgreSQL SQLSTATE
            Dialect::Postgres => match code {
                "23505" => Some(ConstraintKind::Unique),
                "23503" => Some(ConstraintKind::ForeignKey),
                "23514" => Some(ConstraintKind::Check),
                _ => None,
            },
        }
    }

    /// 将数据库错误归类，无法识别的一律视为内部错误
    pub fn classify(self, err: DbErr, context: &str) -> RatingsError {
        let kind = database_code(&err)
            .and_then(|code| self.constraint_kind(&code))
            .or_else(|| match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Some(ConstraintKind::Unique),
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                    Some(ConstraintKind::ForeignKey)
                }
                _ => None,
            });

        match kind {
            Some(ConstraintKind::Unique) => {
                RatingsError::duplicate_key(format!("{context}: {err}"))
            }
            Some(ConstraintKind::ForeignKey) => {
                RatingsError::foreign_key_violation(format!("{context}: {err}"))
            }
            Some(ConstraintKind::Check) => RatingsError::out_of_range(format!("{context}: {err}")),
            None => RatingsError::internal(format!("{context}: {err}")),
        }
    }
}

/// 取出驱动层返回的原始错误码
fn database_code(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(e)) | DbErr::Query(RuntimeErr::SqlxError(e)) => e
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(|code| code.into_owned()),
        _ => None,
    }
}
