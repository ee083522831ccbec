//! Divergence notifications.
//!
//! [`DesktopNotifier`] shells out to the platform's notification command:
//! `termux-notification` on Android, `notify-send` on Linux, `osascript` on
//! macOS and a PowerShell toast on Windows.

use crate::diff::Summary;
use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

/// Title of every divergence notification.
pub const NOTIFICATION_TITLE: &str = "Ani-Tracker: Video Updates Available!";

/// Receives the summary of each comparison run.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &Summary) -> Result<()>;
}

/// Build the notification body, or `None` when nothing changed.
pub fn notification_message(summary: &Summary) -> Option<String> {
    if !summary.has_changes() {
        return None;
    }

    let mut message = format!("{} video(s) need update:\n", summary.total());
    for (label, count) in [
        ("New added", summary.added()),
        ("Removed", summary.removed()),
        ("Renamed", summary.renamed()),
    ] {
        if count > 0 {
            message.push_str(&format!("\t• {label}:\t{count}\n"));
        }
    }
    Some(message)
}

/// Desktop (or Termux) notification delivery.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    android: bool,
}

impl DesktopNotifier {
    /// Create a notifier for the current host.
    pub async fn detect() -> Self {
        let android = crate::platform::is_android().await;
        debug!(android, "desktop notifier ready");
        Self { android }
    }

    async fn deliver(&self, title: &str, message: &str) -> Result<()> {
        let mut command = if self.android {
            let mut cmd = Command::new("termux-notification");
            cmd.args(["--title", title, "--content", message]);
            cmd
        } else {
            platform_command(title, message)
        };

        let output = command
            .output()
            .await
            .map_err(|e| TrackerError::Notify(format!("failed to run notifier: {e}")))?;
        if !output.status.success() {
            return Err(TrackerError::Notify(format!(
                "notifier exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, summary: &Summary) -> Result<()> {
        let Some(message) = notification_message(summary) else {
            return Ok(());
        };
        self.deliver(NOTIFICATION_TITLE, &message).await?;
        info!(total = summary.total(), "notification sent");
        Ok(())
    }
}

#[cfg(target_os = "macos")]
fn platform_command(title: &str, message: &str) -> Command {
    let script = format!(
        r#"display notification "{}" with title "{}""#,
        message.replace('"', r#"\""#).replace('\n', " "),
        title.replace('"', r#"\""#)
    );
    let mut cmd = Command::new("osascript");
    cmd.args(["-e", script.as_str()]);
    cmd
}

#[cfg(target_os = "windows")]
fn platform_command(title: &str, message: &str) -> Command {
    let script = format!(
        r#"[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] | Out-Null; $template = [Windows.UI.Notifications.ToastNotificationManager]::GetTemplateContent([Windows.UI.Notifications.ToastTemplateType]::ToastText02); $text = $template.GetElementsByTagName('text'); $text[0].AppendChild($template.CreateTextNode('{}')) | Out-Null; $text[1].AppendChild($template.CreateTextNode('{}')) | Out-Null; $toast = [Windows.UI.Notifications.ToastNotification]::new($template); [Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier('Ani-Tracker').Show($toast)"#,
        title.replace('\'', "''"),
        message.replace('\'', "''").replace('\n', " ")
    );
    let mut cmd = Command::new("powershell");
    cmd.args(["-NoProfile", "-Command", script.as_str()]);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_command(title: &str, message: &str) -> Command {
    let mut cmd = Command::new("notify-send");
    cmd.args([title, message]);
    cmd
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::diff::{Item, compute_divergence};

    fn summary_of(local: Vec<Vec<Item>>, remote: Vec<Vec<Item>>) -> Summary {
        compute_divergence(&local, &remote).1
    }

    #[test]
    fn no_changes_means_no_message() {
        let snapshot = vec![vec![Item::new("A", "1")]];
        let summary = summary_of(snapshot.clone(), snapshot);
        assert!(notification_message(&summary).is_none());
    }

    #[test]
    fn message_lists_only_non_zero_counts() {
        let summary = summary_of(
            vec![vec![Item::new("Old", "1")]],
            vec![vec![Item::new("New", "1"), Item::new("Extra", "2")]],
        );
        let message = notification_message(&summary).unwrap();
        assert_eq!(
            message,
            "2 video(s) need update:\n\t• New added:\t1\n\t• Renamed:\t1\n"
        );
    }

    #[test]
    fn removed_line_uses_local_only_count() {
        let summary = summary_of(vec![vec![Item::new("Gone", "1")]], vec![vec![]]);
        let message = notification_message(&summary).unwrap();
        assert!(message.contains("• Removed:\t1"));
        assert!(!message.contains("New added"));
    }

    #[tokio::test]
    async fn zero_summary_sends_nothing() {
        let notifier = DesktopNotifier { android: false };
        let summary = summary_of(vec![], vec![]);
        assert!(notifier.notify(&summary).await.is_ok());
    }
}
