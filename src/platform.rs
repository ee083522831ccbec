//! Host platform detection.

use tokio::process::Command;

/// Whether the process runs on Android (Termux).
///
/// Checks `$PREFIX` for the Termux install prefix first, then falls back to
/// `uname -a`.
pub async fn is_android() -> bool {
    if std::env::var("PREFIX").is_ok_and(|prefix| prefix_is_termux(&prefix)) {
        return true;
    }
    Command::new("uname")
        .arg("-a")
        .output()
        .await
        .is_ok_and(|out| uname_is_android(&String::from_utf8_lossy(&out.stdout)))
}

fn prefix_is_termux(prefix: &str) -> bool {
    prefix.contains("com.termux")
}

fn uname_is_android(uname: &str) -> bool {
    uname.to_lowercase().contains("android")
}
