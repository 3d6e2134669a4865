use chrono::{DateTime, FixedOffset};

use crate::settings::entities::ReminderKind;

/// Updates the scheduler hands over to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// The reminder-day counter reached a new value.
    CounterChanged(u64),
    NotificationFired {
        kind: ReminderKind,
        time: DateTime<FixedOffset>,
    },
}
