// SPDX-License-Identifier: MPL-2.0
//! Per-item auto-dismiss countdown.
//!
//! A [`Countdown`] is a `{remaining, running_since}` pair. Pausing folds the
//! elapsed running time into `remaining` and drops the anchor; resuming sets a
//! new anchor. The time spent paused never enters the computation, so any
//! number of pause/resume cycles leaves the total visible time unchanged.

use super::notification::Lifetime;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    /// Time left when the countdown was last anchored. `None` = no countdown.
    remaining: Option<Duration>,
    /// Anchor of the current running stretch. `None` while frozen.
    running_since: Option<Instant>,
}

impl Countdown {
    /// Arms the countdown for `lifetime` starting at `now`, replacing any
    /// previous one. An infinite lifetime leaves no countdown and returns false.
    pub fn start(&mut self, lifetime: Lifetime, now: Instant) -> bool {
        match lifetime.as_duration() {
            Some(duration) => {
                self.remaining = Some(duration);
                self.running_since = Some(now);
                true
            }
            None => {
                self.cancel();
                false
            }
        }
    }

    /// Freezes the countdown, capturing the time left. No-op unless running.
    pub fn pause(&mut self, now: Instant) -> bool {
        let (Some(remaining), Some(since)) = (self.remaining, self.running_since) else {
            return false;
        };
        let elapsed = now.saturating_duration_since(since);
        self.remaining = Some(remaining.saturating_sub(elapsed));
        self.running_since = None;
        true
    }

    /// Continues from the frozen remaining time. No-op unless frozen.
    pub fn resume(&mut self, now: Instant) -> bool {
        if self.remaining.is_none() || self.running_since.is_some() {
            return false;
        }
        self.running_since = Some(now);
        true
    }

    /// Discards the countdown. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.remaining = None;
        self.running_since = None;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.remaining.is_some()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.remaining.is_some() && self.running_since.is_some()
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.remaining.is_some() && self.running_since.is_none()
    }

    /// Time left at `now`.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let remaining = self.remaining?;
        Some(match self.running_since {
            Some(since) => remaining.saturating_sub(now.saturating_duration_since(since)),
            None => remaining,
        })
    }

    /// Instant at which a running countdown expires.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        match (self.remaining, self.running_since) {
            (Some(remaining), Some(since)) => Some(since + remaining),
            _ => None,
        }
    }

    /// Returns true exactly once when a running countdown has reached its
    /// deadline; the countdown is discarded in the same call.
    pub fn poll_expired(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if deadline <= now => {
                self.cancel();
                true
            }
            _ => false,
        }
    }
}
