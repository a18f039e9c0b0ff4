// SPDX-License-Identifier: MPL-2.0
//! Core notification data structures.
//!
//! This module defines the `Notification` item held by the store, together
//! with its identifier, type, screen position, content payload and lifetime.

use super::lifecycle::{PauseTrigger, State};
use super::timer::Countdown;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

/// Unique identifier for a notification.
///
/// Identifiers come from a process-wide counter and are never recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NotificationId(u64);

impl NotificationId {
    /// Creates a new unique notification ID.
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n-{}", self.0)
    }
}

/// Notification type. Selects defaults and, for the promise family, update semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationType {
    #[default]
    Success,
    Error,
    Warning,
    Info,
    /// Pending promise; waits for a resolve or reject update.
    Promise,
    PromiseResolve,
    PromiseReject,
}

impl NotificationType {
    pub const ALL: [NotificationType; 7] = [
        NotificationType::Success,
        NotificationType::Error,
        NotificationType::Warning,
        NotificationType::Info,
        NotificationType::Promise,
        NotificationType::PromiseResolve,
        NotificationType::PromiseReject,
    ];

    /// Returns true for resolve/reject, which update an existing item in place.
    #[must_use]
    pub fn is_promise_result(self) -> bool {
        matches!(
            self,
            NotificationType::PromiseResolve | NotificationType::PromiseReject
        )
    }

    /// Returns true for any promise-related type, pending or settled.
    #[must_use]
    pub fn is_promise_family(self) -> bool {
        self == NotificationType::Promise || self.is_promise_result()
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::Success => "success",
            NotificationType::Error => "error",
            NotificationType::Warning => "warning",
            NotificationType::Info => "info",
            NotificationType::Promise => "promise",
            NotificationType::PromiseResolve => "promise-resolve",
            NotificationType::PromiseReject => "promise-reject",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical screen slot. Visible caps are enforced per position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    TopLeft,
    #[default]
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Position::TopLeft,
        Position::TopCenter,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomCenter,
        Position::BottomRight,
    ];

    #[must_use]
    pub fn is_top(self) -> bool {
        matches!(
            self,
            Position::TopLeft | Position::TopCenter | Position::TopRight
        )
    }

    /// Parses the kebab-case name used in configuration files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "top-left" => Some(Position::TopLeft),
            "top-center" => Some(Position::TopCenter),
            "top-right" => Some(Position::TopRight),
            "bottom-left" => Some(Position::BottomLeft),
            "bottom-center" => Some(Position::BottomCenter),
            "bottom-right" => Some(Position::BottomRight),
            _ => None,
        }
    }
}

/// Visible lifetime of a notification.
///
/// In TOML a lifetime is either an integer number of milliseconds or the
/// string `"infinite"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LifetimeRepr", into = "LifetimeRepr")]
pub enum Lifetime {
    Finite(Duration),
    /// Never auto-clears; only an explicit clear or destroy removes the item.
    Infinite,
}

impl Lifetime {
    #[must_use]
    pub fn from_millis(ms: u64) -> Self {
        Lifetime::Finite(Duration::from_millis(ms))
    }

    #[must_use]
    pub fn as_duration(self) -> Option<Duration> {
        match self {
            Lifetime::Finite(d) => Some(d),
            Lifetime::Infinite => None,
        }
    }

    #[must_use]
    pub fn is_infinite(self) -> bool {
        self == Lifetime::Infinite
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LifetimeRepr {
    Millis(u64),
    Keyword(String),
}

impl TryFrom<LifetimeRepr> for Lifetime {
    type Error = String;

    fn try_from(repr: LifetimeRepr) -> Result<Self, Self::Error> {
        match repr {
            LifetimeRepr::Millis(ms) => Ok(Lifetime::from_millis(ms)),
            LifetimeRepr::Keyword(word) if word.eq_ignore_ascii_case("infinite") => {
                Ok(Lifetime::Infinite)
            }
            LifetimeRepr::Keyword(word) => Err(format!("invalid duration: {word}")),
        }
    }
}

impl From<Lifetime> for LifetimeRepr {
    fn from(lifetime: Lifetime) -> Self {
        match lifetime {
            Lifetime::Finite(d) => {
                LifetimeRepr::Millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            }
            Lifetime::Infinite => LifetimeRepr::Keyword("infinite".to_string()),
        }
    }
}

/// Payload handed to renderers. The store never inspects it, except for
/// duplicate detection on `title` and `message`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Content {
    pub title: String,
    pub message: String,
    /// Arbitrary renderer props.
    pub props: BTreeMap<String, String>,
}

/// A notification item owned by the store.
#[derive(Debug, Clone)]
pub struct Notification {
    pub(crate) id: NotificationId,
    pub(crate) kind: NotificationType,
    pub(crate) state: State,
    pub(crate) content: Content,
    pub(crate) duration: Lifetime,
    pub(crate) countdown: Countdown,
    pub(crate) position: Position,
    /// Monotonic creation sequence; FIFO tie-break for admission.
    pub(crate) created_at: u64,
    pub(crate) duplicate_count: u32,
    pub(crate) skip_queue: bool,
    /// Item-level pause sources still holding this item.
    pub(crate) pause_sources: HashSet<PauseTrigger>,
}

impl Notification {
    /// Returns the notification's unique ID.
    #[must_use]
    pub fn id(&self) -> NotificationId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> NotificationType {
        self.kind
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub fn content(&self) -> &Content {
        &self.content
    }

    #[must_use]
    pub fn duration(&self) -> Lifetime {
        self.duration
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Number of duplicate pushes folded into this item.
    #[must_use]
    pub fn duplicate_count(&self) -> u32 {
        self.duplicate_count
    }

    /// Returns true while a promise item waits for resolve or reject.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.kind == NotificationType::Promise
    }

    /// Returns true while a hover, touch or manual pause on this item is active.
    #[must_use]
    pub fn is_held(&self) -> bool {
        !self.pause_sources.is_empty()
    }

    /// Time left on the countdown at `now`. `None` when no countdown is armed.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.countdown.remaining(now)
    }

    /// Returns true when this item's type, title and message match another push.
    pub(crate) fn matches(&self, kind: NotificationType, content: &Content) -> bool {
        self.kind == kind
            && self.content.title == content.title
            && self.content.message == content.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_ids_are_unique() {
        let a = NotificationId::new();
        let b = NotificationId::new();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn id_display_is_prefixed() {
        let id = NotificationId::new();
        assert!(id.to_string().starts_with("n-"));
    }

    #[test]
    fn promise_family_classification() {
        assert!(NotificationType::PromiseResolve.is_promise_result());
        assert!(NotificationType::PromiseReject.is_promise_result());
        assert!(!NotificationType::Promise.is_promise_result());
        assert!(NotificationType::Promise.is_promise_family());
        assert!(!NotificationType::Info.is_promise_family());
    }

    #[test]
    fn position_names_parse() {
        for position in Position::ALL {
            let name = toml::Value::try_from(position).unwrap();
            assert_eq!(Position::from_name(name.as_str().unwrap()), Some(position));
        }
        assert_eq!(Position::from_name("middle"), None);
    }

    #[test]
    fn only_top_positions_are_top() {
        assert!(Position::TopRight.is_top());
        assert!(!Position::BottomLeft.is_top());
    }

    #[derive(Debug, Deserialize)]
    struct Holder {
        duration: Lifetime,
    }

    #[test]
    fn lifetime_parses_millis_and_keyword() {
        let finite: Holder = toml::from_str("duration = 2500").unwrap();
        assert_eq!(finite.duration, Lifetime::from_millis(2500));

        let infinite: Holder = toml::from_str("duration = \"infinite\"").unwrap();
        assert!(infinite.duration.is_infinite());
    }

    #[test]
    fn lifetime_rejects_unknown_keyword() {
        let parsed: Result<Holder, _> = toml::from_str("duration = \"forever\"");
        assert!(parsed.is_err());
    }
}
