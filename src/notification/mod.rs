//! Contains logic for showing notifications in different environments.
//! [GenericNotifier] is the main artifact of this module that abstracts
//! the operations.

#[cfg(target_os = "linux")]
pub mod linux;
pub mod log;
#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(windows)]
pub mod windows;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use self::log::LogNotifier;

/// Intended to serve as a contract every platform must implement. `Ok` means the notification
/// was handed over to the platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<()>;
}

/// Tries `primary` first and reports through `fallback` when it fails.
pub struct FallbackNotifier {
    primary: Box<dyn NotificationSink>,
    fallback: Box<dyn NotificationSink>,
}

impl FallbackNotifier {
    pub fn new(primary: Box<dyn NotificationSink>, fallback: Box<dyn NotificationSink>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl NotificationSink for FallbackNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        match self.primary.notify(title, message).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Primary notification failed, using fallback: {e:?}");
                self.fallback.notify(title, message).await
            }
        }
    }
}

/// Serves as a cross-compatible NotificationSink implementation. The platform sink is picked at
/// compile time and backed by [LogNotifier].
pub struct GenericNotifier {
    inner: FallbackNotifier,
}

impl GenericNotifier {
    pub fn new() -> Self {
        let primary: Box<dyn NotificationSink> = {
            cfg_if::cfg_if! {
                if #[cfg(target_os = "macos")] {
                    Box::new(macos::MacNotifier)
                } else if #[cfg(target_os = "linux")] {
                    Box::new(linux::NotifySendNotifier)
                } else if #[cfg(windows)] {
                    Box::new(windows::ToastNotifier)
                } else {
                    Box::new(LogNotifier)
                }
            }
        };

        Self {
            inner: FallbackNotifier::new(primary, Box::new(LogNotifier)),
        }
    }
}

impl Default for GenericNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for GenericNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        self.inner.notify(title, message).await
    }
}

/// Runs a notification helper and turns a non-zero exit into an error.
#[cfg(any(target_os = "linux", target_os = "macos", windows))]
async fn run_helper(command: &mut tokio::process::Command) -> Result<()> {
    let output = command.kill_on_drop(true).output().await?;
    if !output.status.success() {
        anyhow::bail!(
            "Notification helper exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};

    use super::{FallbackNotifier, MockNotificationSink, NotificationSink};

    #[tokio::test]
    async fn test_fallback_not_used_on_success() -> Result<()> {
        let mut primary = MockNotificationSink::new();
        primary
            .expect_notify()
            .withf(|title, message| title == "Clock In Reminder" && message == "now")
            .times(1)
            .returning(|_, _| Ok(()));
        let mut fallback = MockNotificationSink::new();
        fallback.expect_notify().never();

        let notifier = FallbackNotifier::new(Box::new(primary), Box::new(fallback));

        notifier.notify("Clock In Reminder", "now").await
    }

    #[tokio::test]
    async fn test_fallback_used_on_failure() -> Result<()> {
        let mut primary = MockNotificationSink::new();
        primary
            .expect_notify()
            .times(1)
            .returning(|_, _| Err(anyhow!("no notification daemon")));
        let mut fallback = MockNotificationSink::new();
        fallback
            .expect_notify()
            .withf(|title, _| title == "Clock Out Reminder")
            .times(1)
            .returning(|_, _| Ok(()));

        let notifier = FallbackNotifier::new(Box::new(primary), Box::new(fallback));

        notifier.notify("Clock Out Reminder", "now").await
    }

    #[tokio::test]
    async fn test_both_failing_reports_error() {
        let mut primary = MockNotificationSink::new();
        primary
            .expect_notify()
            .returning(|_, _| Err(anyhow!("primary")));
        let mut fallback = MockNotificationSink::new();
        fallback
            .expect_notify()
            .returning(|_, _| Err(anyhow!("fallback")));

        let notifier = FallbackNotifier::new(Box::new(primary), Box::new(fallback));

        assert!(notifier.notify("title", "message").await.is_err());
    }
}
