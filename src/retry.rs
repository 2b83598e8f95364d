use std::collections::BTreeSet;
use std::time::Duration;

use http::StatusCode;
use rand::Rng;

/// Exponential backoff configuration for one logical call.
///
/// The defaults wait 500ms before the first retry, grow the wait by 1.5x per
/// retry up to 60s, and give up after three attempts or one hour, whichever
/// comes first.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    max_attempts: usize,
    initial_interval: Duration,
    max_interval: Duration,
    backoff_multiplier: f64,
    max_elapsed_time: Duration,
    jitter_ratio: f64,
    retryable_status_codes: BTreeSet<String>,
    retry_connection_errors: bool,
}

impl RetryPolicy {
    pub fn backoff() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(60),
            backoff_multiplier: 1.5,
            max_elapsed_time: Duration::from_secs(3600),
            jitter_ratio: 0.0,
            retryable_status_codes: BTreeSet::new(),
            retry_connection_errors: true,
        }
    }

    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn initial_interval(mut self, initial_interval: Duration) -> Self {
        self.initial_interval = initial_interval;
        if self.max_interval < self.initial_interval {
            self.max_interval = self.initial_interval;
        }
        self
    }

    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval.max(self.initial_interval);
        self
    }

    pub fn backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = if backoff_multiplier.is_finite() {
            backoff_multiplier.max(1.0)
        } else {
            1.0
        };
        self
    }

    pub fn max_elapsed_time(mut self, max_elapsed_time: Duration) -> Self {
        self.max_elapsed_time = max_elapsed_time;
        self
    }

    pub fn jitter_ratio(mut self, jitter_ratio: f64) -> Self {
        self.jitter_ratio = jitter_ratio.clamp(0.0, 1.0);
        self
    }

    /// Status codes that trigger a retry. Entries are either exact codes such
    /// as `"503"` or class patterns such as `"5XX"`.
    pub fn retryable_status_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable_status_codes = codes
            .into_iter()
            .map(|code| code.into().to_ascii_uppercase())
            .collect();
        self
    }

    pub fn retry_connection_errors(mut self, retry: bool) -> Self {
        self.retry_connection_errors = retry;
        self
    }

    pub fn configured_max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn configured_max_elapsed_time(&self) -> Duration {
        self.max_elapsed_time
    }

    pub fn configured_max_interval(&self) -> Duration {
        self.max_interval
    }

    pub fn configured_status_codes(&self) -> &BTreeSet<String> {
        &self.retryable_status_codes
    }

    pub(crate) fn retries_connection_errors(&self) -> bool {
        self.retry_connection_errors
    }

    /// Fills in the operation's status codes when the caller configured none.
    pub(crate) fn with_default_status_codes(mut self, codes: &[&str]) -> Self {
        if self.retryable_status_codes.is_empty() {
            self = self.retryable_status_codes(codes.iter().copied());
        }
        self
    }

    pub(crate) fn is_retryable_status(&self, status: StatusCode) -> bool {
        let exact = status.as_u16().to_string();
        if self.retryable_status_codes.contains(&exact) {
            return true;
        }
        let class = format!("{}XX", status.as_u16() / 100);
        self.retryable_status_codes.contains(&class)
    }

    /// Wait before retry number `retry_index` (1-based).
    pub(crate) fn backoff_for_retry(&self, retry_index: usize) -> Duration {
        let exponent = retry_index.saturating_sub(1).min(64) as i32;
        let max_nanos = self.max_interval.as_nanos();
        let scaled = self.initial_interval.as_nanos() as f64 * self.backoff_multiplier.powi(exponent);
        let delay_nanos = if !scaled.is_finite() || scaled >= max_nanos as f64 {
            max_nanos
        } else {
            scaled.round() as u128
        };
        let delay = Duration::from_nanos(delay_nanos.min(u64::MAX as u128) as u64);
        self.apply_jitter(delay)
    }

    fn apply_jitter(&self, backoff: Duration) -> Duration {
        if self.jitter_ratio <= f64::EPSILON {
            return backoff;
        }

        let backoff_ms = backoff.as_millis().min(u64::MAX as u128) as u64;
        if backoff_ms <= 1 {
            return backoff;
        }
        let max_interval_ms = self.max_interval.as_millis().min(u64::MAX as u128) as u64;

        let jitter_span = ((backoff_ms as f64) * self.jitter_ratio).round().max(1.0) as u64;
        let low = backoff_ms.saturating_sub(jitter_span);
        let high = backoff_ms.saturating_add(jitter_span).max(low);
        let mut rng = rand::rng();
        let sampled_ms = rng.random_range(low..=high).min(max_interval_ms.max(1));
        Duration::from_millis(sampled_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::backoff()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::StatusCode;

    use super::RetryPolicy;

    #[test]
    fn backoff_grows_by_multiplier_and_caps_at_max_interval() {
        let policy = RetryPolicy::backoff()
            .initial_interval(Duration::from_millis(100))
            .max_interval(Duration::from_millis(350))
            .backoff_multiplier(2.0);

        assert_eq!(policy.backoff_for_retry(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for_retry(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for_retry(3), Duration::from_millis(350));
        assert_eq!(policy.backoff_for_retry(10), Duration::from_millis(350));
    }

    #[test]
    fn jittered_backoff_never_exceeds_max_interval() {
        let policy = RetryPolicy::backoff()
            .initial_interval(Duration::from_millis(100))
            .max_interval(Duration::from_millis(120))
            .jitter_ratio(1.0);

        for _ in 0..256 {
            assert!(policy.backoff_for_retry(3) <= Duration::from_millis(120));
        }
    }

    #[test]
    fn setters_clamp_to_invariants() {
        let policy = RetryPolicy::backoff()
            .max_attempts(0)
            .backoff_multiplier(0.25)
            .initial_interval(Duration::from_secs(5))
            .max_interval(Duration::from_secs(1));

        assert_eq!(policy.configured_max_attempts(), 1);
        assert_eq!(policy.backoff_for_retry(2), Duration::from_secs(5));
        assert_eq!(policy.configured_max_interval(), Duration::from_secs(5));
    }

    #[test]
    fn status_codes_match_exact_and_class_patterns() {
        let policy = RetryPolicy::backoff().retryable_status_codes(["429", "5xx"]);

        assert!(policy.is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(policy.is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!policy.is_retryable_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn operation_status_codes_only_fill_an_empty_set() {
        let defaulted = RetryPolicy::backoff().with_default_status_codes(&["503"]);
        assert!(defaulted.is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));

        let explicit = RetryPolicy::backoff()
            .retryable_status_codes(["429"])
            .with_default_status_codes(&["503"]);
        assert!(!explicit.is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
    }
}
