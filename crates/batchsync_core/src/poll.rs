use std::time::Duration;

use crate::{ApiError, CacheKey, CachedValue};

/// Fixed polling intervals; the delay is a pure function of the cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub job_interval: Duration,
    pub list_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            job_interval: Duration::from_millis(2000),
            list_interval: Duration::from_millis(5000),
        }
    }
}

impl PollPolicy {
    fn interval(&self, key: &CacheKey) -> Duration {
        match key {
            CacheKey::Job(_) => self.job_interval,
            CacheKey::JobList => self.list_interval,
        }
    }

    /// Delay before the next poll of `key`, or `None` to stop polling.
    ///
    /// Single jobs poll while queued or running. The list polls while any
    /// job in it is still in progress.
    pub fn next_delay(&self, key: &CacheKey, value: Option<&CachedValue>) -> Option<Duration> {
        let active = match value {
            Some(CachedValue::Job(job)) => !job.is_terminal(),
            Some(CachedValue::List(jobs)) => jobs.iter().any(|job| !job.is_terminal()),
            // Nothing known yet: keep trying.
            None => true,
        };
        active.then(|| self.interval(key))
    }

    /// Delay after a failed fetch. The failure counts as "status unchanged",
    /// except that a job the server no longer knows is not polled again.
    pub fn delay_after_failure(
        &self,
        key: &CacheKey,
        value: Option<&CachedValue>,
        error: &ApiError,
    ) -> Option<Duration> {
        if matches!(error, ApiError::NotFound(_)) {
            return None;
        }
        self.next_delay(key, value)
    }
}
