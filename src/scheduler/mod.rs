use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use poller::ReminderLoop;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    notification::{GenericNotifier, NotificationSink},
    settings::{
        entities::{Settings, ValidationError},
        store::{JsonSettingsStore, SettingsStore},
    },
    utils::clock::{Clock, DefaultClock},
};

pub mod events;
pub mod poller;
pub mod shutdown;
pub mod tracker;

use events::SchedulerEvent;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Upper bound for a single notification, so a hanging platform helper can't stall polling.
pub(crate) const NOTIFY_TIMEOUT: Duration = Duration::from_secs(15);

const EVENT_BUFFER: usize = 16;

pub const TEST_TITLE: &str = "Test Notification";
pub const TEST_MESSAGE: &str = "This is a test reminder notification!";

struct PollingTask {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the reminder settings and at most one polling task.
///
/// Settings reach the task through a [watch] channel, anything the presentation layer should
/// display comes back as [SchedulerEvent]s.
pub struct ReminderScheduler {
    settings: Arc<watch::Sender<Settings>>,
    store: Arc<dyn SettingsStore>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    events: mpsc::Sender<SchedulerEvent>,
    poll_interval: Duration,
    task: Option<PollingTask>,
}

impl ReminderScheduler {
    pub fn new(
        settings: Settings,
        store: Arc<dyn SettingsStore>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        events: mpsc::Sender<SchedulerEvent>,
    ) -> Self {
        let (settings, _) = watch::channel(settings);
        Self {
            settings: Arc::new(settings),
            store,
            notifier,
            clock,
            events,
            poll_interval: DEFAULT_POLL_INTERVAL,
            task: None,
        }
    }

    /// Sets how often the task wakes up while waiting for the next minute. Clamped to 1..=60s.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL);
        self
    }

    pub fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Validates the targets and spawns the polling task. Does nothing if a task is alive.
    pub async fn start(&mut self) -> Result<(), ValidationError> {
        if self.is_running() {
            debug!("Reminders are already running");
            return Ok(());
        }
        self.settings.borrow().validate()?;

        self.settings.send_modify(|settings| settings.running = true);
        self.persist().await;

        let shutdown = CancellationToken::new();
        let poller = ReminderLoop::new(
            self.settings.clone(),
            self.store.clone(),
            self.notifier.clone(),
            self.clock.clone(),
            self.events.clone(),
            shutdown.clone(),
            self.poll_interval,
        );
        let handle = tokio::spawn(poller.run());
        self.task = Some(PollingTask { shutdown, handle });

        info!("Reminders started");
        Ok(())
    }

    /// Stops the polling task and remembers that reminders are off.
    pub async fn stop(&mut self) {
        self.halt().await;
        self.settings.send_modify(|settings| settings.running = false);
        self.persist().await;
        info!("Reminders stopped");
    }

    /// Stops the polling task for process exit. The running flag is kept so the next start of the
    /// service resumes reminders.
    pub async fn shutdown(mut self) {
        self.halt().await;
        self.persist().await;
    }

    /// Fires a notification right away, bypassing the time check.
    pub async fn test_notify(&self) -> Result<()> {
        tokio::time::timeout(NOTIFY_TIMEOUT, self.notifier.notify(TEST_TITLE, TEST_MESSAGE))
            .await
            .map_err(|_| anyhow!("Test notification timed out"))?
    }

    /// Replaces targets, format and timezone. A running task uses them from its next poll on.
    pub async fn update_settings(&self, settings: &Settings) {
        self.settings
            .send_modify(|current| current.apply_configuration(settings));
        self.persist().await;
    }

    async fn halt(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.shutdown.cancel();
            if let Err(e) = (&mut task.handle).await {
                error!("Reminder task ended abnormally {e:?}");
            }
        }
    }

    async fn persist(&self) {
        let snapshot = self.settings.borrow().clone();
        self.store.save(&snapshot).await;
    }
}

impl Drop for PollingTask {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Represents the starting point for the service. Resumes reminders if they were running and
/// keeps polling until the process is asked to stop.
pub async fn start_service(dir: PathBuf, poll_interval: Duration) -> Result<()> {
    let store = Arc::new(JsonSettingsStore::new(dir)?);
    let settings = store.load().await;

    let (sender, receiver) = mpsc::channel::<SchedulerEvent>(EVENT_BUFFER);
    let mut scheduler = ReminderScheduler::new(
        settings,
        store,
        Arc::new(GenericNotifier::new()),
        Arc::new(DefaultClock),
        sender,
    )
    .with_poll_interval(poll_interval);

    if !scheduler.settings().running {
        info!("Reminders are stopped, nothing to serve");
        return Ok(());
    }
    scheduler.start().await?;

    let shutdown_token = CancellationToken::new();
    tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        report_events(receiver, shutdown_token),
    );

    scheduler.shutdown().await;
    Ok(())
}

/// Console stand-in for a presentation layer.
async fn report_events(mut receiver: mpsc::Receiver<SchedulerEvent>, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            event = receiver.recv() => match event {
                Some(SchedulerEvent::CounterChanged(count)) => {
                    info!("Reminder days: {count}");
                    println!("Reminder days: {count}");
                }
                Some(SchedulerEvent::NotificationFired { kind, time }) => {
                    info!("Fired {kind} reminder at {}", time.format("%Y-%m-%d %H:%M"));
                }
                None => return,
            }
        }
    }
}
