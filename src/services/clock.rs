/// Wall clock, injectable so bucket and countdown logic can be tested
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Whole seconds between two timestamps, never negative
pub fn elapsed_secs(from_ms: i64, to_ms: i64) -> u64 {
    (to_ms.saturating_sub(from_ms).max(0) / 1000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_secs_truncates_and_clamps() {
        assert_eq!(elapsed_secs(1_000, 3_999), 2);
        assert_eq!(elapsed_secs(5_000, 1_000), 0);
    }
}
