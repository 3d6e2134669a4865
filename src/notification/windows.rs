use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use super::{run_helper, NotificationSink};

/// Any registered AppUserModelID works; PowerShell's own is always present.
const APP_ID: &str =
    r"{1AC14E77-02E7-4E5D-B744-2EB1AE5198B7}\WindowsPowerShell\v1.0\powershell.exe";

const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Shows a toast through the WinRT notification API, driven from PowerShell.
pub struct ToastNotifier;

#[async_trait]
impl NotificationSink for ToastNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        let script = format!(
            r#"
[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] | Out-Null
$template = [Windows.UI.Notifications.ToastNotificationManager]::GetTemplateContent([Windows.UI.Notifications.ToastTemplateType]::ToastText02)
$text = $template.GetElementsByTagName('text')
$text.Item(0).AppendChild($template.CreateTextNode('{}')) | Out-Null
$text.Item(1).AppendChild($template.CreateTextNode('{}')) | Out-Null
$toast = [Windows.UI.Notifications.ToastNotification]::new($template)
[Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier('{APP_ID}').Show($toast)
"#,
            escape(title),
            escape(message),
        );

        let mut command = Command::new("powershell");
        command.args(["-NoProfile", "-NonInteractive", "-Command", script.as_str()]);
        command.creation_flags(CREATE_NO_WINDOW);

        run_helper(&mut command)
            .await
            .context("PowerShell toast failed")
    }
}

fn escape(value: &str) -> String {
    value.replace('\'', "''")
}
