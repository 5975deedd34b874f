use chrono::{DateTime, Duration, Utc};

use crate::model::RetentionPolicy;

/// Immutable state shared by every component of one run: the policy and the
/// clock snapshot taken at startup.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub policy: RetentionPolicy,
    pub now: DateTime<Utc>,
}

impl RunContext {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self::at(policy, Utc::now())
    }

    /// Build a context with a fixed clock.
    pub fn at(policy: RetentionPolicy, now: DateTime<Utc>) -> Self {
        Self { policy, now }
    }

    /// Whether `instant` lies less than `days` before `now`.
    pub fn is_within_days(&self, instant: DateTime<Utc>, days: u32) -> bool {
        self.now - instant < Duration::days(i64::from(days))
    }
}
