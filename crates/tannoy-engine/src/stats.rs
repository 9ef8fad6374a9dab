//! Dispatch statistics — per-rule counters and the aggregate view
//! surfaced by the gateway, persisted so restarts keep history.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tannoy_core::types::ChannelKind;

/// Counters for one rule. Every dispatch attempt lands in exactly one
/// of `sent` or `errors`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleStats {
    pub triggered: u64,
    pub sent: u64,
    pub errors: u64,
    pub last_triggered: Option<DateTime<Utc>>,
}

/// Aggregate across all rules.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalStats {
    pub total_sent: u64,
    pub total_errors: u64,
    /// Percentage of attempts that succeeded; 100 when nothing has
    /// been attempted yet.
    pub success_rate: f64,
}

/// One dispatched-notification summary for the recent-activity feed.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRecord {
    pub rule_id: String,
    pub rule_name: String,
    pub title: String,
    pub platforms: Vec<ChannelKind>,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

/// Tracks dispatch outcomes per rule.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StatsTracker {
    rules: HashMap<String, RuleStats>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Record one dispatch attempt.
    pub fn record_outcome(&mut self, rule_id: &str, success: bool) {
        let entry = self.rules.entry(rule_id.to_string()).or_default();
        entry.triggered += 1;
        if success {
            entry.sent += 1;
        } else {
            entry.errors += 1;
        }
        entry.last_triggered = Some(Utc::now());
    }

    pub fn rule(&self, rule_id: &str) -> Option<&RuleStats> {
        self.rules.get(rule_id)
    }

    pub fn per_rule(&self) -> &HashMap<String, RuleStats> {
        &self.rules
    }

    pub fn global(&self) -> GlobalStats {
        let (sent, errors) = self
            .rules
            .values()
            .fold((0, 0), |(s, e), r| (s + r.sent, e + r.errors));
        let attempts = sent + errors;
        let success_rate = if attempts == 0 {
            100.0
        } else {
            sent as f64 / attempts as f64 * 100.0
        };
        GlobalStats {
            total_sent: sent,
            total_errors: errors,
            success_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_add_up() {
        let mut tracker = StatsTracker::new();
        tracker.record_outcome("r-1", true);
        tracker.record_outcome("r-1", true);
        tracker.record_outcome("r-1", false);
        tracker.record_outcome("r-2", true);

        let r1 = tracker.rule("r-1").unwrap();
        assert_eq!(r1.triggered, 3);
        assert_eq!(r1.sent, 2);
        assert_eq!(r1.errors, 1);
        assert_eq!(r1.triggered, r1.sent + r1.errors);
        assert!(r1.last_triggered.is_some());

        let global = tracker.global();
        assert_eq!(global.total_sent, 3);
        assert_eq!(global.total_errors, 1);
        assert!((global.success_rate - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_success_rate_with_no_attempts_is_100() {
        let tracker = StatsTracker::new();
        assert!((tracker.global().success_rate - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tracker_roundtrips_through_json() {
        let mut tracker = StatsTracker::new();
        tracker.record_outcome("r-1", true);
        tracker.record_outcome("r-1", false);

        let value = serde_json::to_value(&tracker).unwrap();
        let back: StatsTracker = serde_json::from_value(value).unwrap();
        let r1 = back.rule("r-1").unwrap();
        assert_eq!(r1.sent, 1);
        assert_eq!(r1.errors, 1);
    }
}
