//! Filter evaluation — the time/weekday/keyword gate applied after a
//! trigger matches.
//!
//! All categories must pass; absent categories pass by definition.
//! Callers hand in the wall-clock `now` so behavior is testable, but in
//! production it is always the drain-time local clock — filters gate on
//! when the notification would go out, not when the event occurred.

use chrono::{DateTime, Datelike, Local, Timelike};

use crate::events::NotificationEvent;
use crate::rules::RuleFilters;

/// Check every configured filter category against the event.
pub fn passes(filters: &RuleFilters, event: &NotificationEvent, now: DateTime<Local>) -> bool {
    within_time_window(filters, now)
        && on_allowed_weekday(filters, now)
        && contains_keyword(filters, event)
}

/// Inclusive [start, end] window compared as HHMM integers, so a
/// 09:00–17:00 window admits 09:00 and 17:00 but not 17:01. A bound
/// that fails to parse rejects — a misconfigured window must not turn
/// a quiet-hours rule into an always-on one. A single valid bound is
/// not a window and enforces nothing.
fn within_time_window(filters: &RuleFilters, now: DateTime<Local>) -> bool {
    let start = filters.start_time.as_deref().map(parse_hhmm);
    let end = filters.end_time.as_deref().map(parse_hhmm);
    match (start, end) {
        (Some(Some(start)), Some(Some(end))) => {
            let current = now.hour() * 100 + now.minute();
            current >= start && current <= end
        }
        (Some(None), _) | (_, Some(None)) => false,
        _ => true,
    }
}

/// "HH:MM" → HHMM integer ("09:30" → 930).
fn parse_hhmm(s: &str) -> Option<u32> {
    let (h, m) = s.split_once(':')?;
    let h: u32 = h.trim().parse().ok()?;
    let m: u32 = m.trim().parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 100 + m)
}

fn on_allowed_weekday(filters: &RuleFilters, now: DateTime<Local>) -> bool {
    let Some(weekdays) = &filters.weekdays else {
        return true;
    };
    let today = now.weekday().num_days_from_sunday() as u8;
    weekdays.contains(&today)
}

/// Any-of, case-insensitive substring search over the serialized
/// payload, so keywords hit values nested anywhere in the event data.
fn contains_keyword(filters: &RuleFilters, event: &NotificationEvent) -> bool {
    let Some(keywords) = &filters.keywords else {
        return true;
    };
    let haystack = event.data.to_string().to_lowercase();
    keywords
        .iter()
        .any(|keyword| haystack.contains(&keyword.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(hour: u32, minute: u32) -> DateTime<Local> {
        // 2026-03-02 is a Monday.
        Local.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    fn window(start: &str, end: &str) -> RuleFilters {
        RuleFilters {
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
            ..RuleFilters::default()
        }
    }

    fn any_event() -> NotificationEvent {
        NotificationEvent::system("monitor", serde_json::json!({"message": "disk full"}))
    }

    #[test]
    fn test_no_filters_pass() {
        assert!(passes(&RuleFilters::default(), &any_event(), local(3, 0)));
    }

    #[test]
    fn test_time_window_boundaries_inclusive() {
        let filters = window("09:00", "17:00");
        assert!(passes(&filters, &any_event(), local(9, 0)));
        assert!(passes(&filters, &any_event(), local(12, 30)));
        assert!(passes(&filters, &any_event(), local(17, 0)));
        assert!(!passes(&filters, &any_event(), local(8, 59)));
        assert!(!passes(&filters, &any_event(), local(17, 1)));
    }

    #[test]
    fn test_malformed_time_window_rejects() {
        assert!(!passes(&window("9am", "17:00"), &any_event(), local(12, 0)));
        assert!(!passes(&window("09:00", "25:00"), &any_event(), local(12, 0)));

        // Even without the other bound, an unparseable one rejects.
        let broken = RuleFilters {
            start_time: Some("noonish".to_string()),
            ..RuleFilters::default()
        };
        assert!(!passes(&broken, &any_event(), local(12, 0)));
    }

    #[test]
    fn test_half_configured_window_is_ignored() {
        let filters = RuleFilters {
            start_time: Some("09:00".to_string()),
            ..RuleFilters::default()
        };
        assert!(passes(&filters, &any_event(), local(3, 0)));
    }

    #[test]
    fn test_weekday_filter() {
        let weekdays_only = RuleFilters {
            weekdays: Some(vec![1, 2, 3, 4, 5]),
            ..RuleFilters::default()
        };
        // 2026-03-02 is a Monday (1), 2026-03-07 a Saturday (6).
        let monday = Local.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let saturday = Local.with_ymd_and_hms(2026, 3, 7, 10, 0, 0).unwrap();
        assert!(passes(&weekdays_only, &any_event(), monday));
        assert!(!passes(&weekdays_only, &any_event(), saturday));
    }

    #[test]
    fn test_keyword_filter_is_case_insensitive_and_nested() {
        let filters = RuleFilters {
            keywords: Some(vec!["URGENT".to_string(), "outage".to_string()]),
            ..RuleFilters::default()
        };

        let nested = NotificationEvent::system(
            "monitor",
            serde_json::json!({"report": {"summary": "Partial OUTAGE in eu-west"}}),
        );
        let bland = NotificationEvent::system(
            "monitor",
            serde_json::json!({"report": {"summary": "all quiet"}}),
        );

        assert!(passes(&filters, &nested, local(10, 0)));
        assert!(!passes(&filters, &bland, local(10, 0)));
    }

    #[test]
    fn test_empty_keyword_list_rejects() {
        let filters = RuleFilters {
            keywords: Some(vec![]),
            ..RuleFilters::default()
        };
        assert!(!passes(&filters, &any_event(), local(10, 0)));
    }

    #[test]
    fn test_all_categories_must_pass() {
        let mut filters = window("09:00", "17:00");
        filters.keywords = Some(vec!["disk".to_string()]);
        // Keyword hits but the hour is outside the window.
        assert!(!passes(&filters, &any_event(), local(20, 0)));
        // Both pass.
        assert!(passes(&filters, &any_event(), local(10, 0)));
    }
}
