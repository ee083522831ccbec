//! Configuration types for the playlist tracker.
//!
//! A [`TrackerConfig`] is built once at the process boundary (defaults, then an
//! optional TOML file, then CLI flags) and handed by value to the scheduler and
//! the conductor. Nothing below the binary reads ambient configuration.

use crate::error::{Result, TrackerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Directory that relative file paths resolve against.
    pub working_dir: PathBuf,
    /// Log to the log file instead of stderr.
    pub daemon: bool,
    /// Only track playlists that are bookmarked.
    pub use_bookmarks_only: bool,
    /// Tick interval and retry policy.
    pub schedule: ScheduleConfig,
    /// Data, export, marker and log file locations.
    pub files: FileConfig,
    /// Lifecycle marker observation.
    pub watcher: WatcherConfig,
    /// Remote playlist fetching.
    pub fetch: FetchConfig,
    /// Summary notifications.
    pub notify: NotifyConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            daemon: true,
            use_bookmarks_only: false,
            schedule: ScheduleConfig::default(),
            files: FileConfig::default(),
            watcher: WatcherConfig::default(),
            fetch: FetchConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

/// Scheduler timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Time between two ticks.
    #[serde(with = "duration_text")]
    pub interval: Duration,
    /// Attempts per tick before the failure becomes fatal (at least 1).
    pub max_attempts: u32,
    /// Retry `k` waits `k * backoff_unit`.
    #[serde(with = "duration_text")]
    pub backoff_unit: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

/// File locations, relative to [`TrackerConfig::working_dir`] unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub history: PathBuf,
    pub bookmarks: PathBuf,
    pub diff: PathBuf,
    pub lock: PathBuf,
    pub log: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            history: PathBuf::from("history.json"),
            bookmarks: PathBuf::from("bookmark.json"),
            diff: PathBuf::from("playlists.diff"),
            lock: PathBuf::from("ani-tracker.lock"),
            log: PathBuf::from("ani-tracker.log"),
        }
    }
}

/// Lifecycle marker observation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// How often the marker file is checked.
    #[serde(with = "duration_text")]
    pub poll_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Remote fetcher settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Explicit `yt-dlp` binary (None = look it up on `PATH`).
    pub binary: Option<PathBuf>,
}

/// Notification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Never send notifications.
    pub silent: bool,
}

impl TrackerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| TrackerError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TrackerError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the scheduler and watcher cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.schedule.interval.is_zero() {
            return Err(TrackerError::Config("interval must be greater than zero".to_owned()));
        }
        if self.schedule.max_attempts == 0 {
            return Err(TrackerError::Config("max_attempts must be at least 1".to_owned()));
        }
        if self.watcher.poll_interval.is_zero() {
            return Err(TrackerError::Config(
                "watcher poll_interval must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }

    /// Resolve `path` against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    pub fn history_path(&self) -> PathBuf {
        self.resolve(&self.files.history)
    }

    pub fn bookmarks_path(&self) -> PathBuf {
        self.resolve(&self.files.bookmarks)
    }

    pub fn diff_path(&self) -> PathBuf {
        self.resolve(&self.files.diff)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.resolve(&self.files.lock)
    }

    pub fn log_path(&self) -> PathBuf {
        self.resolve(&self.files.log)
    }
}

/// Parse a duration such as `90`, `45s`, `15m`, `1h30m`, `2d` or `500ms`.
///
/// A bare number is read as seconds.
///
/// # Errors
///
/// Returns [`TrackerError::Config`] for empty input, unknown units or overflow.
pub fn parse_duration(text: &str) -> Result<Duration> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TrackerError::Config("empty duration".to_owned()));
    }
    if let Ok(secs) = text.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let invalid = || TrackerError::Config(format!("invalid duration `{text}`"));
    let mut total = Duration::ZERO;
    let mut rest = text;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        if digits_end == 0 {
            return Err(invalid());
        }
        let value: u64 = rest[..digits_end].parse().map_err(|_| invalid())?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let millis_per_unit: u64 = match &rest[..unit_end] {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            "d" => 86_400_000,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_end..];

        let part = value.checked_mul(millis_per_unit).ok_or_else(invalid)?;
        total = total
            .checked_add(Duration::from_millis(part))
            .ok_or_else(invalid)?;
    }

    Ok(total)
}

/// Render a duration in the format accepted by [`parse_duration`].
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis == 0 {
        return "0s".to_owned();
    }
    if millis % 1_000 != 0 {
        return format!("{millis}ms");
    }

    let mut secs = duration.as_secs();
    let mut out = String::new();
    for (unit, size) in [("h", 3_600), ("m", 60), ("s", 1)] {
        if secs >= size {
            out.push_str(&format!("{}{unit}", secs / size));
            secs %= size;
        }
    }
    out
}

/// Serde adapter storing durations as `1h30m`-style text.
mod duration_text {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.schedule.interval, Duration::from_secs(3600));
        assert_eq!(config.schedule.max_attempts, 3);
        assert_eq!(config.schedule.backoff_unit, Duration::from_secs(1));
        assert!(config.daemon);
        assert!(!config.notify.silent);
    }

    #[test]
    fn parse_duration_accepts_units_and_compounds() {
        assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("2d").unwrap(), Duration::from_secs(172_800));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration(" 1m30s ").unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        for bad in ["", "h", "10x", "1.5h", "-5s", "m10"] {
            assert!(parse_duration(bad).is_err(), "`{bad}` should be rejected");
        }
    }

    #[test]
    fn format_duration_is_parseable() {
        for d in [
            Duration::from_secs(3600),
            Duration::from_secs(5400),
            Duration::from_secs(61),
            Duration::from_millis(1500),
            Duration::ZERO,
        ] {
            assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
        }
        assert_eq!(format_duration(Duration::from_secs(5400)), "1h30m");
    }

    #[test]
    fn validate_rejects_zero_values() {
        let mut config = TrackerConfig::default();
        config.schedule.interval = Duration::ZERO;
        assert!(matches!(config.validate(), Err(TrackerError::Config(_))));

        let mut config = TrackerConfig::default();
        config.schedule.max_attempts = 0;
        assert!(matches!(config.validate(), Err(TrackerError::Config(_))));

        let mut config = TrackerConfig::default();
        config.watcher.poll_interval = Duration::ZERO;
        assert!(matches!(config.validate(), Err(TrackerError::Config(_))));
    }

    #[test]
    fn relative_paths_resolve_against_working_dir() {
        let config = TrackerConfig {
            working_dir: PathBuf::from("/srv/tracker"),
            ..TrackerConfig::default()
        };
        assert_eq!(config.history_path(), PathBuf::from("/srv/tracker/history.json"));
        assert_eq!(config.lock_path(), PathBuf::from("/srv/tracker/ani-tracker.lock"));
        assert_eq!(
            config.resolve(Path::new("/var/log/t.log")),
            PathBuf::from("/var/log/t.log")
        );
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = TrackerConfig::default();
        config.schedule.interval = Duration::from_secs(900);
        config.schedule.backoff_unit = Duration::from_millis(250);
        config.use_bookmarks_only = true;
        config.files.diff = PathBuf::from("out.diff");

        config.save_to_file(&path).unwrap();
        let loaded = TrackerConfig::from_file(&path).unwrap();

        assert_eq!(loaded.schedule.interval, Duration::from_secs(900));
        assert_eq!(loaded.schedule.backoff_unit, Duration::from_millis(250));
        assert!(loaded.use_bookmarks_only);
        assert_eq!(loaded.files.diff, PathBuf::from("out.diff"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let loaded: TrackerConfig = toml::from_str(
            r#"
            [schedule]
            interval = "15m"
            "#,
        )
        .unwrap();
        assert_eq!(loaded.schedule.interval, Duration::from_secs(900));
        assert_eq!(loaded.schedule.max_attempts, 3);
        assert_eq!(loaded.files.history, PathBuf::from("history.json"));
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        assert!(matches!(
            TrackerConfig::from_file(&path),
            Err(TrackerError::Config(_))
        ));
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = TrackerConfig::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(TrackerError::Io(_))));
    }
}
