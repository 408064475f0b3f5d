use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use tokio::time::{sleep, Duration};
use tracing::debug;

/// Picks a random delay in `[min_delay, max_delay)` milliseconds, capped at `cap`.
pub fn random_delay(min_delay: u64, max_delay: u64, cap: Duration) -> Duration {
    let mut rng = StdRng::from_entropy();
    let delay = if min_delay < max_delay {
        rng.gen_range(min_delay..max_delay)
    } else {
        min_delay
    };
    Duration::from_millis(delay).min(cap)
}

/// Sleeps for a random delay in `[min_delay, max_delay)` milliseconds, never longer than `cap`.
pub async fn generate_random_delay(min_delay: u64, max_delay: u64, cap: Duration) {
    let delay = random_delay(min_delay, max_delay, cap);

    debug!("Delay: {} milliseconds", delay.as_millis());
    sleep(delay).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_stays_in_range_and_under_cap() {
        for _ in 0..50 {
            let delay = random_delay(100, 200, Duration::from_secs(1));
            assert!(delay >= Duration::from_millis(100) && delay < Duration::from_millis(200));
        }
        assert_eq!(
            random_delay(1000, 3000, Duration::from_millis(10)),
            Duration::from_millis(10)
        );
        assert_eq!(random_delay(5, 5, Duration::from_secs(1)), Duration::from_millis(5));
    }
}
