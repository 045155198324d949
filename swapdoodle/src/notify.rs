//! User-facing notifications.
//!
//! Sessions report load outcomes through a [`NotificationSink`]. The
//! [`ToastBoard`] keeps them around for a short while the way a status area
//! would; [`LogSink`] forwards them to `log`.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::Level;
use serde::Serialize;

/// How long a toast stays on the board.
pub const TOAST_LIFETIME: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn log_level(self) -> Level {
        match self {
            Severity::Info => Level::Info,
            Severity::Warn => Level::Warn,
            Severity::Error => Level::Error,
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warn => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, title, message)
    }

    pub fn warn(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, title, message)
    }
}

impl Display for Notification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

pub trait NotificationSink {
    fn push(&mut self, notification: Notification);
}

/// Forwards notifications to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn push(&mut self, notification: Notification) {
        log::log!(notification.severity.log_level(), "{notification}");
    }
}

/// Notifications keyed by creation time in milliseconds since the epoch.
#[derive(Debug, Default, Clone)]
pub struct ToastBoard {
    toasts: BTreeMap<u64, Notification>,
}

impl ToastBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a toast created at `now_ms` and returns its key.
    ///
    /// A key already in use is bumped to the next free millisecond.
    pub fn push_at(&mut self, now_ms: u64, notification: Notification) -> u64 {
        let mut key = now_ms;
        while self.toasts.contains_key(&key) {
            key += 1;
        }
        self.toasts.insert(key, notification);
        key
    }

    /// Drops toasts older than [`TOAST_LIFETIME`] and returns the rest, oldest
    /// first.
    pub fn active_at(&mut self, now_ms: u64) -> Vec<(u64, &Notification)> {
        let lifetime = TOAST_LIFETIME.as_millis() as u64;
        self.toasts
            .retain(|&created, _| now_ms.saturating_sub(created) < lifetime);
        self.toasts.iter().map(|(&k, n)| (k, n)).collect()
    }

    pub fn active(&mut self) -> Vec<(u64, &Notification)> {
        self.active_at(now_millis())
    }

    pub fn dismiss(&mut self, key: u64) -> Option<Notification> {
        self.toasts.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

impl NotificationSink for ToastBoard {
    fn push(&mut self, notification: Notification) {
        self.push_at(now_millis(), notification);
    }
}

impl<S: NotificationSink + ?Sized> NotificationSink for &mut S {
    fn push(&mut self, notification: Notification) {
        (**self).push(notification);
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_after_lifetime() {
        let mut board = ToastBoard::new();
        board.push_at(1_000, Notification::info("Loaded", "first"));
        board.push_at(3_000, Notification::error("Failed", "second"));

        assert_eq!(board.active_at(5_999).len(), 2);

        let active = board.active_at(6_000);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].0, 3_000);
        assert_eq!(active[0].1.message, "second");

        assert!(board.active_at(8_000).is_empty());
        assert!(board.is_empty());
    }

    #[test]
    fn colliding_timestamps_get_distinct_keys() {
        let mut board = ToastBoard::new();
        let a = board.push_at(42, Notification::info("a", ""));
        let b = board.push_at(42, Notification::info("b", ""));
        let c = board.push_at(43, Notification::info("c", ""));

        assert_eq!((a, b, c), (42, 43, 44));
        assert_eq!(board.len(), 3);
        assert_eq!(board.dismiss(43).map(|n| n.title), Some("b".to_owned()));
    }

    #[test]
    fn severity_maps_to_log_level() {
        assert_eq!(Severity::Warn.log_level(), Level::Warn);
        assert!(Severity::Error > Severity::Info);
    }
}
