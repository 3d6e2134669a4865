use std::{sync::Arc, time::Duration};

use chrono::{DateTime, FixedOffset};
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    watch,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    notification::NotificationSink,
    settings::{
        entities::{ReminderKind, Settings},
        store::SettingsStore,
        time::TimeOfDay,
    },
    utils::{clock::Clock, time::until_next_minute},
};

use super::{events::SchedulerEvent, tracker::ReminderTracker, NOTIFY_TIMEOUT};

/// Settings are written at least this often even when nothing fires.
const PERSIST_INTERVAL: Duration = Duration::from_secs(60);

/// The polling task behind [ReminderScheduler](super::ReminderScheduler).
pub struct ReminderLoop {
    settings: Arc<watch::Sender<Settings>>,
    store: Arc<dyn SettingsStore>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    events: mpsc::Sender<SchedulerEvent>,
    shutdown: CancellationToken,
    poll_interval: Duration,
    tracker: ReminderTracker,
}

impl ReminderLoop {
    pub fn new(
        settings: Arc<watch::Sender<Settings>>,
        store: Arc<dyn SettingsStore>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        events: mpsc::Sender<SchedulerEvent>,
        shutdown: CancellationToken,
        poll_interval: Duration,
    ) -> Self {
        let tracker = ReminderTracker::from_settings(&settings.borrow());
        Self {
            settings,
            store,
            notifier,
            clock,
            events,
            shutdown,
            poll_interval,
            tracker,
        }
    }

    /// Executes the reminder event loop until the shutdown token is cancelled.
    pub async fn run(mut self) {
        let mut last_persisted = self.clock.instant();
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let fired = self.poll().await;

            if fired || self.clock.instant() - last_persisted >= PERSIST_INTERVAL {
                self.persist().await;
                last_persisted = self.clock.instant();
            }

            let wait = until_next_minute(&self.clock.time()).min(self.poll_interval);
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = self.clock.sleep(wait) => ()
            }
        }

        self.persist().await;
        debug!("Reminder loop stopped");
    }

    /// Runs a single check against the current minute. Returns whether anything fired.
    async fn poll(&mut self) -> bool {
        let settings = self.settings.borrow().clone();
        let now = self.clock.now_in(&settings.timezone);

        let due = self.tracker.due(&settings, now.naive_local());
        for kind in &due {
            self.fire(*kind, now).await;
        }
        if due.is_empty() {
            return false;
        }
        self.settings
            .send_modify(|settings| self.tracker.record(settings));
        true
    }

    async fn fire(&mut self, kind: ReminderKind, now: DateTime<FixedOffset>) {
        let message = kind.message(TimeOfDay::of(&now));
        let span = info_span!("Firing reminder", %kind);

        // A sink runs in its own task so that a panic inside it can't end the loop.
        let notifier = self.notifier.clone();
        let delivery = tokio::spawn(
            async move { notifier.notify(kind.title(), &message).await }.instrument(span),
        );
        let abort = delivery.abort_handle();
        match tokio::time::timeout(NOTIFY_TIMEOUT, delivery).await {
            Ok(Ok(Ok(()))) => info!("Delivered {kind} reminder"),
            Ok(Ok(Err(e))) => error!("Failed to deliver {kind} reminder {e:?}"),
            Ok(Err(e)) => error!("Notification sink crashed while delivering {kind} reminder {e}"),
            Err(_) => {
                abort.abort();
                error!("Delivering {kind} reminder timed out");
            }
        }
        self.send(SchedulerEvent::NotificationFired { kind, time: now });

        // Only clock-in marks a reminder day.
        if kind == ReminderKind::ClockIn && self.tracker.count_day(now.date_naive()) {
            let mut count = 0;
            self.settings.send_modify(|settings| {
                settings.reminder_count += 1;
                count = settings.reminder_count;
            });
            info!("Reminder day counter is now {count}");
            self.send(SchedulerEvent::CounterChanged(count));
        }
    }

    fn send(&self, event: SchedulerEvent) {
        match self.events.try_send(event) {
            Ok(()) => (),
            Err(TrySendError::Full(event)) => {
                warn!("Presentation layer is lagging, dropping {event:?}")
            }
            Err(TrySendError::Closed(event)) => debug!("Nobody listens for {event:?}"),
        }
    }

    async fn persist(&self) {
        let snapshot = self.settings.borrow().clone();
        self.store.save(&snapshot).await;
    }
}
