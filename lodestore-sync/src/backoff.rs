//! Jittered exponential backoff.

use rand::Rng;
use std::time::Duration;

/// Delay before retry `attempt` (zero-based): exponential growth from
/// `base_ms`, capped at `max_ms`, with the lower half randomized so
/// concurrent model loops do not retry in lockstep.
#[must_use]
pub fn backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let exp = base_ms.saturating_mul(2u64.saturating_pow(attempt)).min(max_ms);
    let half = exp / 2;
    let jitter = rand::thread_rng().gen_range(0..=half.max(1));
    Duration::from_millis(half + jitter)
}
