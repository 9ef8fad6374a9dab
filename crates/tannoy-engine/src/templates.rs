//! Message templates — how a matched rule's payload becomes text.
//!
//! Lookup goes through the `TemplateResolver` trait so deployments can
//! bring their own catalog; the engine itself never hardcodes template
//! ids. `BuiltinTemplates` covers the platform's stock notifications.
//! Unknown ids are not an error — the dispatcher falls back to a
//! generic rendering that carries the raw event payload, because a
//! notification with an ugly body still beats a dropped one.

use serde_json::Value;

/// A rendered outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub title: String,
    pub message: String,
}

/// Template lookup and rendering capability.
pub trait TemplateResolver: Send + Sync {
    /// Render `template_id` with `data`. `None` means the id is
    /// unknown to this catalog.
    fn render(&self, template_id: &str, data: &Value) -> Option<RenderedMessage>;
}

/// Replace `{{key}}` placeholders with top-level fields of `data`.
/// Unknown placeholders are left as-is so missing data is visible in
/// the delivered message instead of silently blank.
pub fn substitute(text: &str, data: &Value) -> String {
    let Some(map) = data.as_object() else {
        return text.to_string();
    };
    let mut out = text.to_string();
    for (key, value) in map {
        let placeholder = format!("{{{{{key}}}}}");
        if !out.contains(&placeholder) {
            continue;
        }
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out = out.replace(&placeholder, &rendered);
    }
    out
}

/// Generic rendering for template ids no resolver knows.
pub fn fallback(rule_name: &str, event_kind: &str, data: &Value) -> RenderedMessage {
    RenderedMessage {
        title: rule_name.to_string(),
        message: format!("{event_kind} event: {data}"),
    }
}

/// The stock template catalog: (id, title, body).
const BUILTIN: &[(&str, &str, &str)] = &[
    (
        "ticket_created",
        "New support ticket",
        "Ticket {{ticket_id}} opened by {{customer}}: {{subject}}",
    ),
    (
        "ticket_escalated",
        "Ticket escalated",
        "Ticket {{ticket_id}} escalated to severity {{severity}}",
    ),
    (
        "invoice_overdue",
        "Invoice overdue",
        "Invoice {{invoice_id}} for {{customer}} is {{days_overdue}} day(s) overdue ({{amount}})",
    ),
    (
        "project_deadline",
        "Project deadline approaching",
        "Project {{project}} is due {{due_date}} — {{days_left}} day(s) left",
    ),
    (
        "employee_onboarded",
        "New team member",
        "{{employee}} joined {{department}} as {{role}}",
    ),
    (
        "leave_requested",
        "Leave request",
        "{{employee}} requested {{days}} day(s) of {{leave_type}} leave",
    ),
    (
        "workflow_completed",
        "Workflow finished",
        "Workflow {{workflow}} completed with status {{status}}",
    ),
    (
        "system_alert",
        "System alert",
        "{{source}} reported: {{message}} (severity {{severity}})",
    ),
];

/// Resolver over the stock catalog.
#[derive(Debug, Default)]
pub struct BuiltinTemplates;

impl TemplateResolver for BuiltinTemplates {
    fn render(&self, template_id: &str, data: &Value) -> Option<RenderedMessage> {
        let (_, title, body) = BUILTIN.iter().find(|(id, _, _)| *id == template_id)?;
        Some(RenderedMessage {
            title: substitute(title, data),
            message: substitute(body, data),
        })
    }
}
