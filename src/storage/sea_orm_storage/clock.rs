//! 单调递增的写入时间戳

use std::sync::atomic::{AtomicI64, Ordering};

/// 为同一存储实例生成严格递增的微秒时间戳
///
/// 同一微秒内（或同一批次内）写入的多行仍然能按写入先后排序。
#[derive(Debug, Default)]
pub(crate) struct InsertClock {
    last: AtomicI64,
}

impl InsertClock {
    pub(crate) fn now_micros(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_micros();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strictly_increasing() {
        let clock = InsertClock::default();
        let mut prev = clock.now_micros();
        for _ in 0..1000 {
            let next = clock.now_micros();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn test_follows_wall_clock() {
        let clock = InsertClock::default();
        let before = chrono::Utc::now().timestamp_micros();
        assert!(clock.now_micros() >= before);
    }
}
