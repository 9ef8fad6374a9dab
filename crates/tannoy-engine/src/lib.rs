//! # Tannoy Engine
//!
//! Rule-based notification core: business events go in, throttled and
//! templated notifications come out. Optimized for a single always-on
//! process — SQLite persistence, tokio timers, no broker.
//!
//! ## Architecture
//! ```text
//! Producers (gateway, schedulers, integrations)
//!   → add_event → EventQueue (mutex-guarded buffer)
//!
//! Drain loop (tokio interval, one batch per tick)
//!   → for each event, for each enabled rule:
//!     ├── trigger: event kind + compiled condition ("severity >= 4")
//!     ├── filters: time window / weekdays / keywords
//!     ├── throttle: per-rule hour + day windows
//!     └── actions: template render → DeliveryRequest → Delivery
//!           ├── delay 0: sent inline
//!           └── delay N: parked in a tracked task, settled on shutdown
//!
//! Every dispatch outcome → per-rule stats + history ring → SQLite
//! ```

pub mod condition;
pub mod dispatch;
pub mod engine;
pub mod events;
pub mod filters;
pub mod persistence;
pub mod queue;
pub mod rules;
pub mod stats;
pub mod templates;
pub mod throttle;

pub use condition::Condition;
pub use dispatch::ActionDispatcher;
pub use engine::{NotificationEngine, spawn_engine};
pub use events::{EventKind, NotificationEvent};
pub use persistence::{DocumentStore, MemoryStore, SqliteStore};
pub use queue::EventQueue;
pub use rules::{NotificationRule, Platform, RuleAction, RuleFilters, RuleTrigger, ThrottleConfig};
pub use stats::{DispatchRecord, GlobalStats, RuleStats, StatsTracker};
pub use templates::{BuiltinTemplates, RenderedMessage, TemplateResolver};
pub use throttle::ThrottleTracker;
