use std::future::Future;
use std::time::Duration;

use crate::errors::{RatingsError, Result};

/// 为任意存储操作附加调用方给定的截止时间
///
/// 超时后内部 future 被丢弃：连接归还连接池，未提交的事务随之回滚。
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(RatingsError::internal(format!(
            "operation exceeded deadline of {} ms",
            deadline.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let value = with_deadline(Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_expired_deadline_is_internal() {
        let err = with_deadline(
            Duration::from_millis(10),
            std::future::pending::<Result<()>>(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "E007");
        assert!(err.message().contains("deadline"));
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let err = with_deadline(Duration::from_secs(1), async {
            Err::<(), _>(RatingsError::not_found("missing"))
        })
        .await
        .unwrap_err();
        assert_eq!(err.code(), "E005");
    }
}
