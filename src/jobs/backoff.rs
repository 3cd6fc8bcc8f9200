use rand::Rng;
use std::time::Duration;

/// Cap on the exponent so delays stay bounded (~4.5 h with a 60 s base).
const MAX_EXPONENT: u32 = 8;

/// Exponential backoff with jitter for failed job attempts:
/// `base * 2^attempt`, randomized by ±25%.
pub fn retry_delay(attempt: i32, base_delay_secs: u32) -> Duration {
    let attempt = (attempt.max(0) as u32).min(MAX_EXPONENT);
    let base = base_delay_secs.saturating_mul(2_u32.saturating_pow(attempt));

    let jitter = rand::thread_rng().gen_range(0.75..1.25);
    let secs = (base as f64 * jitter).round() as u64;

    Duration::from_secs(secs)
}
