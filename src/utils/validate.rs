use crate::errors::{RatingsError, Result};

/// 必填字符串字段不能为空白，在进入数据库之前拦截
pub fn require_non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RatingsError::empty_value(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_rejected() {
        let err = require_non_empty("code", "   ").unwrap_err();
        assert_eq!(err.code(), "E001");
        assert_eq!(err.message(), "code must not be empty");
        assert!(require_non_empty("name", "").is_err());
    }

    #[test]
    fn test_value_trimmed() {
        assert_eq!(require_non_empty("code", " S209 ").unwrap(), "S209");
    }
}
