use rand::Rng;
use std::time::Duration;

/// Exponential backoff parameters.
///
/// Delays start at `initial_interval`, grow by `multiplier` per retry up to
/// `max_interval`, and are randomized by `randomization_factor` in both
/// directions.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub randomization_factor: f64,
    pub max_interval: Duration,
    /// Ceiling on the time since the first attempt. `None` keeps retrying
    /// until the operation succeeds or fails permanently.
    pub max_elapsed_time: Option<Duration>,
    /// Cap on the number of attempts, including the first one.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            multiplier: 1.5,
            randomization_factor: 0.5,
            max_interval: Duration::from_secs(60),
            max_elapsed_time: Some(Duration::from_secs(15 * 60)),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Policy for a single remote call: gives up after 30 seconds.
    pub fn mutation() -> Self {
        Self {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Self::default()
        }
    }

    /// Policy for status polling: gives up after 15 minutes.
    pub fn polling() -> Self {
        Self::default()
    }

    /// Retries until success or a permanent failure.
    pub fn unbounded() -> Self {
        Self {
            max_elapsed_time: None,
            ..Self::default()
        }
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_randomization_factor(mut self, factor: f64) -> Self {
        self.randomization_factor = factor;
        self
    }

    pub fn with_max_elapsed_time(mut self, max_elapsed_time: Option<Duration>) -> Self {
        self.max_elapsed_time = max_elapsed_time;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay before retry number `retry` (1 = the first retry), without jitter.
    pub fn base_interval(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(64) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        let secs = (self.initial_interval.as_secs_f64() * factor).min(self.max_interval.as_secs_f64());
        Duration::try_from_secs_f64(secs).unwrap_or(self.max_interval)
    }

    /// Delay before retry number `retry`, randomized within
    /// `base * (1 ± randomization_factor)`.
    pub fn jittered_interval(&self, retry: u32) -> Duration {
        let base = self.base_interval(retry);
        let factor = self.randomization_factor.clamp(0.0, 1.0);
        if factor == 0.0 || base.is_zero() {
            return base;
        }
        let jitter = rand::rng().random_range(-factor..=factor);
        base.mul_f64(1.0 + jitter)
    }
}
