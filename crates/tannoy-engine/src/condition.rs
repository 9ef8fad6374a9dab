//! Trigger conditions — a tiny comparison language compiled once per
//! rule and evaluated against event payloads.
//!
//! Three comparison forms, probed in fixed order:
//! - `field >= n`   numeric
//! - `field == s`   string equality, quotes stripped
//! - `field < n`    numeric, or "timestamp is in the past" when the
//!   right-hand side is the literal `now()`
//!
//! Empty source always matches; anything unparseable compiles to a
//! condition that never matches. A broken rule must stay quiet, not
//! crash the drain or fire on everything.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A compiled trigger condition.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Condition {
    /// Blank source — the trigger's event kind alone decides.
    Always,
    /// `field >= n`
    GteNum { field: String, value: f64 },
    /// `field == s`
    EqStr { field: String, value: String },
    /// `field < n`
    LtNum { field: String, value: f64 },
    /// `field < now()` — field holds an RFC3339 timestamp in the past.
    BeforeNow { field: String },
    /// Unparseable source — never matches.
    #[default]
    Invalid,
}

impl Condition {
    /// Compile condition source. Total: bad input yields `Invalid`,
    /// never an error.
    pub fn parse(source: &str) -> Self {
        let source = source.trim();
        if source.is_empty() {
            return Condition::Always;
        }

        // Probe order matters: ">=" must win before "<" sees it.
        if let Some((field, rhs)) = split_operands(source, ">=") {
            return match rhs.parse::<f64>() {
                Ok(value) => Condition::GteNum { field, value },
                Err(_) => Condition::Invalid,
            };
        }
        if let Some((field, rhs)) = split_operands(source, "==") {
            return Condition::EqStr {
                field,
                value: strip_quotes(&rhs).to_string(),
            };
        }
        if let Some((field, rhs)) = split_operands(source, "<") {
            if rhs == "now()" {
                return Condition::BeforeNow { field };
            }
            return match rhs.parse::<f64>() {
                Ok(value) => Condition::LtNum { field, value },
                Err(_) => Condition::Invalid,
            };
        }

        Condition::Invalid
    }

    /// Evaluate against an event payload. Never errors: a missing or
    /// mistyped field simply does not match.
    pub fn matches(&self, data: &Value) -> bool {
        match self {
            Condition::Always => true,
            Condition::GteNum { field, value } => {
                field_number(data, field).is_some_and(|n| n >= *value)
            }
            Condition::EqStr { field, value } => {
                field_string(data, field).is_some_and(|s| s == *value)
            }
            Condition::LtNum { field, value } => {
                field_number(data, field).is_some_and(|n| n < *value)
            }
            Condition::BeforeNow { field } => {
                field_timestamp(data, field).is_some_and(|t| t < Utc::now())
            }
            Condition::Invalid => false,
        }
    }
}

/// Split "lhs OP rhs" around the first occurrence of `op`. Either side
/// empty means the source is not this form.
fn split_operands(source: &str, op: &str) -> Option<(String, String)> {
    let (lhs, rhs) = source.split_once(op)?;
    let lhs = lhs.trim();
    let rhs = rhs.trim();
    if lhs.is_empty() || rhs.is_empty() {
        return None;
    }
    Some((lhs.to_string(), rhs.to_string()))
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'')
}

/// Field as a number: JSON numbers directly, numeric strings coerced.
fn field_number(data: &Value, field: &str) -> Option<f64> {
    match data.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Field as text: strings as-is, other scalars stringified.
fn field_string(data: &Value, field: &str) -> Option<String> {
    match data.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field_timestamp(data: &Value, field: &str) -> Option<DateTime<Utc>> {
    let raw = data.get(field)?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_forms() {
        assert_eq!(Condition::parse(""), Condition::Always);
        assert_eq!(Condition::parse("   "), Condition::Always);
        assert_eq!(
            Condition::parse("severity >= 4"),
            Condition::GteNum { field: "severity".into(), value: 4.0 }
        );
        assert_eq!(
            Condition::parse("status == \"failed\""),
            Condition::EqStr { field: "status".into(), value: "failed".into() }
        );
        assert_eq!(
            Condition::parse("queue_depth < 10"),
            Condition::LtNum { field: "queue_depth".into(), value: 10.0 }
        );
        assert_eq!(
            Condition::parse("due_date < now()"),
            Condition::BeforeNow { field: "due_date".into() }
        );
    }

    #[test]
    fn test_parse_garbage_never_matches() {
        for source in ["severity", "severity >= banana", "<= 5", "a ~ b", "< 5"] {
            let condition = Condition::parse(source);
            assert_eq!(condition, Condition::Invalid, "source: {source}");
            assert!(!condition.matches(&json!({"severity": 99})));
        }
    }

    #[test]
    fn test_gte_probed_before_lt() {
        // ">=" contains no "<", but make sure compiling probes ">="
        // first so "x >= 3" never parses as a "<" form.
        let condition = Condition::parse("load>=0.75");
        assert_eq!(
            condition,
            Condition::GteNum { field: "load".into(), value: 0.75 }
        );
    }

    #[test]
    fn test_gte_matching() {
        let condition = Condition::parse("severity >= 4");
        assert!(condition.matches(&json!({"severity": 4})));
        assert!(condition.matches(&json!({"severity": 5.5})));
        assert!(!condition.matches(&json!({"severity": 3})));
        // Numeric strings coerce; non-numeric values never match.
        assert!(condition.matches(&json!({"severity": "7"})));
        assert!(!condition.matches(&json!({"severity": "high"})));
        assert!(!condition.matches(&json!({"other": 9})));
    }

    #[test]
    fn test_eq_matching_strips_quotes() {
        let condition = Condition::parse("status == 'failed'");
        assert!(condition.matches(&json!({"status": "failed"})));
        assert!(!condition.matches(&json!({"status": "ok"})));
        assert!(!condition.matches(&json!({})));
    }

    #[test]
    fn test_lt_matching() {
        let condition = Condition::parse("stock < 10");
        assert!(condition.matches(&json!({"stock": 3})));
        assert!(!condition.matches(&json!({"stock": 10})));
    }

    #[test]
    fn test_before_now() {
        let condition = Condition::parse("due_date < now()");
        assert!(condition.matches(&json!({"due_date": "2020-01-01T00:00:00Z"})));
        assert!(!condition.matches(&json!({"due_date": "2099-01-01T00:00:00Z"})));
        // Not a timestamp: fail closed.
        assert!(!condition.matches(&json!({"due_date": "tomorrow"})));
        assert!(!condition.matches(&json!({"due_date": 5})));
    }

    #[test]
    fn test_default_is_invalid() {
        assert_eq!(Condition::default(), Condition::Invalid);
    }
}
