use rand::Rng;
use std::time::Duration;

/// Exponential backoff with ±30% jitter, capped so the exponent cannot
/// run away on repeated failures.
pub fn calculate_backoff_delay(attempt: u32, base_delay_ms: u64) -> Duration {
    let capped_attempt = attempt.min(6);
    let base = base_delay_ms.saturating_mul(1u64 << capped_attempt);
    let jitter_factor = rand::thread_rng().gen_range(0.7..1.3);
    Duration::from_millis((base as f64 * jitter_factor).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_progression() {
        let d0 = calculate_backoff_delay(0, 1000);
        let d1 = calculate_backoff_delay(1, 1000);
        let d2 = calculate_backoff_delay(2, 1000);

        assert!(d0.as_millis() >= 700 && d0.as_millis() <= 1300);
        assert!(d1.as_millis() >= 1400 && d1.as_millis() <= 2600);
        assert!(d2.as_millis() >= 2800 && d2.as_millis() <= 5200);
    }

    #[test]
    fn backoff_is_capped() {
        let high = calculate_backoff_delay(40, 1000);
        let capped = calculate_backoff_delay(6, 1000);
        // Both sit at the attempt-6 plateau: 64s ±30%.
        assert!(high.as_millis() >= 44_800 && high.as_millis() <= 83_200);
        assert!(capped.as_millis() >= 44_800 && capped.as_millis() <= 83_200);
    }
}
