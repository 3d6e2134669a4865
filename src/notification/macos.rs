use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use super::{run_helper, NotificationSink};

/// Shows a Notification Center banner through AppleScript.
pub struct MacNotifier;

#[async_trait]
impl NotificationSink for MacNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        let script = format!(
            r#"display notification "{}" with title "{}" sound name "default""#,
            escape(message),
            escape(title)
        );

        run_helper(Command::new("osascript").arg("-e").arg(script))
            .await
            .context("osascript failed")
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
