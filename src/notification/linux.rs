use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use super::{run_helper, NotificationSink};

const APP_NAME: &str = "Clock Reminder";

/// Uses `notify-send` from libnotify, available on most desktop environments.
pub struct NotifySendNotifier;

#[async_trait]
impl NotificationSink for NotifySendNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        run_helper(
            Command::new("notify-send")
                .args(["--app-name", APP_NAME])
                .arg(title)
                .arg(message),
        )
        .await
        .context("notify-send failed")
    }
}
