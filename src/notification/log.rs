use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::NotificationSink;

/// Last resort sink. Prints the notification to the console and the log, which always succeeds.
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        info!("Notification: {title} - {message}");
        println!("{title}: {message}");
        Ok(())
    }
}
