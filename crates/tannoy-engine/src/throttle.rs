//! Per-rule rate limiting — reset-on-expiry counting windows.
//!
//! Each rule gets an hourly and a daily window. A window that has
//! outlived its span restarts from zero at the next check; there is no
//! sliding decay. Rejections never consume a slot, so a burst that hits
//! the limit does not push the reset further out.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::rules::NotificationRule;

#[derive(Debug, Clone)]
struct WindowState {
    hour_count: u32,
    hour_started: DateTime<Utc>,
    day_count: u32,
    day_started: DateTime<Utc>,
}

/// Tracks notification counts per rule id.
#[derive(Debug, Default)]
pub struct ThrottleTracker {
    states: HashMap<String, WindowState>,
}

impl ThrottleTracker {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
        }
    }

    /// Whether `rule` may fire at `now`. A pass is counted against both
    /// windows; a rejection leaves the counters untouched.
    pub fn check(&mut self, rule: &NotificationRule, now: DateTime<Utc>) -> bool {
        let Some(throttle) = &rule.throttle else {
            return true;
        };
        if !throttle.enabled {
            return true;
        }

        let state = self
            .states
            .entry(rule.id.clone())
            .or_insert_with(|| WindowState {
                hour_count: 0,
                hour_started: now,
                day_count: 0,
                day_started: now,
            });

        if now - state.hour_started > Duration::hours(1) {
            state.hour_count = 0;
            state.hour_started = now;
        }
        if now - state.day_started > Duration::hours(24) {
            state.day_count = 0;
            state.day_started = now;
        }

        if let Some(max) = throttle.max_per_hour
            && state.hour_count >= max
        {
            return false;
        }
        if let Some(max) = throttle.max_per_day
            && state.day_count >= max
        {
            return false;
        }

        state.hour_count += 1;
        state.day_count += 1;
        true
    }

    /// Drop counters for a removed rule.
    pub fn forget(&mut self, rule_id: &str) {
        self.states.remove(rule_id);
    }
}
