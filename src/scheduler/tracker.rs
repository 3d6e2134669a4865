use std::collections::HashMap;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::warn;

use crate::settings::{
    entities::{ReminderKind, Settings},
    time::TimeOfDay,
};

/// Remembers what already fired so that one target produces one notification per minute it
/// matches, and the reminder-day counter moves at most once per date. The state is mirrored into
/// [Settings] so a restarted service picks up where the previous one stopped.
#[derive(Debug, Default)]
pub struct ReminderTracker {
    last_fired: HashMap<ReminderKind, NaiveDateTime>,
    last_counted_date: Option<NaiveDate>,
}

impl ReminderTracker {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            last_fired: ReminderKind::ALL
                .into_iter()
                .filter_map(|kind| Some((kind, settings.last_fired(kind)?)))
                .collect(),
            last_counted_date: settings.last_counted_date,
        }
    }

    /// Writes the firing history into `settings`.
    pub fn record(&self, settings: &mut Settings) {
        for (kind, minute) in &self.last_fired {
            settings.set_last_fired(*kind, *minute);
        }
        settings.last_counted_date = self.last_counted_date;
    }

    /// Returns the targets that match `now` and haven't fired during this minute yet. Targets
    /// that can't be parsed never match.
    pub fn due(&mut self, settings: &Settings, now: NaiveDateTime) -> Vec<ReminderKind> {
        let current = TimeOfDay::of(&now);
        let minute_start = now
            .with_second(0)
            .and_then(|v| v.with_nanosecond(0))
            .unwrap_or(now);

        let mut due = Vec::new();
        for kind in ReminderKind::ALL {
            let target = match settings.target(kind) {
                Ok(target) => target,
                Err(e) => {
                    warn!("Skipping {kind} reminder: {e}");
                    continue;
                }
            };
            if target != current || self.last_fired.get(&kind) == Some(&minute_start) {
                continue;
            }
            self.last_fired.insert(kind, minute_start);
            due.push(kind);
        }
        due
    }

    /// Marks `date` as a reminder day. Returns `true` only the first time a date is seen.
    pub fn count_day(&mut self, date: NaiveDate) -> bool {
        if self.last_counted_date == Some(date) {
            return false;
        }
        self.last_counted_date = Some(date);
        true
    }
}

/// Finds the closest upcoming target strictly after `now`, wrapping to tomorrow for targets that
/// already passed today. Targets that can't be parsed are ignored. On a tie clock-in wins.
pub fn next_event(settings: &Settings, now: NaiveDateTime) -> Option<(ReminderKind, NaiveDateTime)> {
    ReminderKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let target = settings.target(kind).ok()?;
            let time = NaiveTime::from_hms_opt(target.hour().into(), target.minute().into(), 0)?;
            let today = now.date().and_time(time);
            let next = if today > now {
                today
            } else {
                today.checked_add_days(Days::new(1))?
            };
            Some((kind, next))
        })
        .min_by_key(|(_, time)| *time)
}
