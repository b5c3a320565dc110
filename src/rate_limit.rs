use std::time::{Duration, Instant};

use dashmap::DashMap;

const MAX_FAILURES: u32 = 5;
const WINDOW: Duration = Duration::from_secs(15 * 60);

/// Per-email brute-force guard for login. Counts failed attempts inside a
/// fixed window; a successful login clears the slate.
pub struct LoginRateLimiter {
    failures: DashMap<String, (u32, Instant)>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            failures: DashMap::new(),
        }
    }

    /// Returns `Err(retry_after_secs)` once the window holds too many
    /// failures. Never increments; call `record_failure` for that.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        let Some(entry) = self.failures.get(&email.to_lowercase()) else {
            return Ok(());
        };
        let (count, start) = *entry.value();

        if start.elapsed() > WINDOW {
            return Ok(());
        }
        if count >= MAX_FAILURES {
            let elapsed = start.elapsed().as_secs();
            return Err(WINDOW.as_secs().saturating_sub(elapsed));
        }
        Ok(())
    }

    pub fn record_failure(&self, email: &str) {
        let mut entry = self
            .failures
            .entry(email.to_lowercase())
            .or_insert((0, Instant::now()));
        let (count, start) = entry.value_mut();

        if start.elapsed() > WINDOW {
            *count = 1;
            *start = Instant::now();
        } else {
            *count += 1;
        }
    }

    pub fn clear(&self, email: &str) {
        self.failures.remove(&email.to_lowercase());
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
