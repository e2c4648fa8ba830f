use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Per-email login brute force limiter. Counts failures inside a fixed window
/// that starts at the first failure.
pub struct LoginRateLimiter {
    /// email -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
    max_failures: u32,
    window: Duration,
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(15 * 60))
    }
}

impl LoginRateLimiter {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_failures,
            window,
        }
    }

    /// Returns the seconds until the window resets when the email is locked.
    /// Does not count as an attempt; call `record_failure` on a bad password.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        let Some(entry) = self.entries.get(&email.to_lowercase()) else {
            return Ok(());
        };

        let (count, start) = *entry.value();
        let elapsed = start.elapsed();

        if elapsed > self.window || count < self.max_failures {
            return Ok(());
        }

        Err(self.window.saturating_sub(elapsed).as_secs())
    }

    pub fn record_failure(&self, email: &str) {
        let now = Instant::now();
        let mut entry = self.entries.entry(email.to_lowercase()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > self.window {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    pub fn clear(&self, email: &str) {
        self.entries.remove(&email.to_lowercase());
    }

    /// Drop entries whose window has passed.
    pub fn cleanup(&self) {
        let window = self.window;
        self.entries.retain(|_, (_, start)| start.elapsed() <= window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locks_after_max_failures() {
        let limiter = LoginRateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.check("a@example.com").is_ok());
            limiter.record_failure("a@example.com");
        }
        let retry_after = limiter.check("A@Example.com").unwrap_err();
        assert!(retry_after <= 60);
    }

    #[test]
    fn clear_unlocks() {
        let limiter = LoginRateLimiter::new(1, Duration::from_secs(60));
        limiter.record_failure("a@example.com");
        assert!(limiter.check("a@example.com").is_err());
        limiter.clear("a@example.com");
        assert!(limiter.check("a@example.com").is_ok());
    }

    #[test]
    fn expired_window_allows_again() {
        let limiter = LoginRateLimiter::new(1, Duration::ZERO);
        limiter.record_failure("a@example.com");
        std::thread::sleep(Duration::from_millis(5));
        assert!(limiter.check("a@example.com").is_ok());
        limiter.cleanup();
        assert!(limiter.entries.is_empty());
    }
}
