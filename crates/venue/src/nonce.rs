use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of request nonces for one credential set.
///
/// Values must be unique and strictly increasing across every request sent with
/// the same credentials, including concurrent ones.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> u64;
}

/// Wall-clock nanoseconds, bumped past the previous value when the clock has not moved.
#[derive(Debug, Default)]
pub struct MonotonicNonce {
    last: AtomicU64,
}

impl MonotonicNonce {
    pub fn new() -> Self {
        Self::default()
    }

    fn now_nanos() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

impl NonceSource for MonotonicNonce {
    fn next_nonce(&self) -> u64 {
        let now = Self::now_nanos();
        let mut prev = self.last.load(Ordering::Acquire);
        loop {
            let next = now.max(prev.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}
