// SPDX-License-Identifier: MPL-2.0
//! Per-item lifecycle state machine.
//!
//! ```text
//! Incoming ──► Queued ──► Visible ⇄ Paused ──► Clearing ──► Destroyed
//!     └──────────────────────▲
//! ```
//!
//! [`transition`] is the pure table. [`apply`] also runs the countdown side
//! effect bound to each edge. The store calls `apply` and turns the outcome
//! into [`StoreEvent`]s, which renderers use as animation hooks.

use super::notification::{Notification, NotificationId, NotificationType};
use std::time::Instant;

/// Lifecycle phase of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Inserted, admission not evaluated yet.
    Incoming,
    /// Waiting for a visible slot in its position.
    Queued,
    Visible,
    /// Visible with a frozen countdown.
    Paused,
    /// Exit animation running.
    Clearing,
    Destroyed,
}

impl State {
    /// Visible or paused: occupies a slot and may hold a countdown.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, State::Visible | State::Paused)
    }

    /// Waiting for admission.
    #[must_use]
    pub fn is_waiting(self) -> bool {
        matches!(self, State::Incoming | State::Queued)
    }

    /// Clearing or destroyed: no further countdown activity.
    #[must_use]
    pub fn is_leaving(self) -> bool {
        matches!(self, State::Clearing | State::Destroyed)
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    SlotAvailable,
    NoSlot,
    Pause,
    Resume,
    Expire,
    Clear,
    ClearAll,
    AnimationEnd,
    Destroy,
}

/// Source of a pause or resume request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PauseTrigger {
    Hover,
    Touch,
    /// Window or tab hidden/shown.
    Visibility,
    /// Programmatic; never gated by configuration.
    Manual,
}

/// Returns the next state, or `None` when `event` is ignored in `from`.
#[must_use]
pub fn transition(from: State, event: Event) -> Option<State> {
    use Event as E;
    use State as S;

    match (from, event) {
        (S::Destroyed, _) => None,
        (_, E::Destroy) => Some(S::Destroyed),
        (S::Incoming | S::Queued, E::SlotAvailable) => Some(S::Visible),
        (S::Incoming, E::NoSlot) => Some(S::Queued),
        (S::Visible, E::Pause) => Some(S::Paused),
        (S::Paused, E::Resume) => Some(S::Visible),
        (S::Visible | S::Paused, E::Expire | E::Clear | E::ClearAll) => Some(S::Clearing),
        (S::Clearing, E::AnimationEnd) => Some(S::Destroyed),
        _ => None,
    }
}

/// Applies `event` to `item`, running the countdown side effect of the edge.
///
/// Pausing an item without a running countdown is ignored, so an infinite
/// item stays `Visible` under hover.
pub(crate) fn apply(item: &mut Notification, event: Event, now: Instant) -> Option<State> {
    if event == Event::Pause && !item.countdown.is_running() {
        return None;
    }
    let next = transition(item.state, event)?;

    match next {
        State::Visible if item.state == State::Paused => {
            item.countdown.resume(now);
        }
        State::Visible => {
            item.countdown.start(item.duration, now);
        }
        State::Paused => {
            item.countdown.pause(now);
        }
        State::Incoming | State::Queued | State::Clearing | State::Destroyed => {
            item.countdown.cancel();
        }
    }

    item.state = next;
    Some(next)
}

/// Forces `Destroyed` from any live state and discards the countdown.
pub(crate) fn destroy(item: &mut Notification) -> bool {
    if transition(item.state, Event::Destroy).is_none() {
        return false;
    }
    item.countdown.cancel();
    item.state = State::Destroyed;
    true
}

/// Re-enters the visible flow after a promise settles, as if freshly
/// admitted with the new duration.
pub(crate) fn restart(item: &mut Notification, now: Instant, keep_paused: bool) {
    item.state = State::Visible;
    item.countdown.start(item.duration, now);
    if keep_paused {
        apply(item, Event::Pause, now);
    }
}

/// Lifecycle hooks emitted by the store.
///
/// Renderers run enter/leave animations on these. After a `Clearing` event
/// they must report back with `Store::finish_clearing` (or
/// `Message::AnimationEnd`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Admitted {
        id: NotificationId,
        animation: String,
    },
    Queued {
        id: NotificationId,
    },
    /// Content, type or duration rewritten in place (promise settled).
    Updated {
        id: NotificationId,
        kind: NotificationType,
    },
    /// A duplicate push was folded into this item.
    Duplicated {
        id: NotificationId,
        count: u32,
    },
    Paused {
        id: NotificationId,
    },
    Resumed {
        id: NotificationId,
    },
    /// Exit hook. `animation` is empty when no leave animation is configured.
    Clearing {
        id: NotificationId,
        animation: String,
    },
    Destroyed {
        id: NotificationId,
    },
}

impl StoreEvent {
    #[must_use]
    pub fn id(&self) -> NotificationId {
        match self {
            StoreEvent::Admitted { id, .. }
            | StoreEvent::Queued { id }
            | StoreEvent::Updated { id, .. }
            | StoreEvent::Duplicated { id, .. }
            | StoreEvent::Paused { id }
            | StoreEvent::Resumed { id }
            | StoreEvent::Clearing { id, .. }
            | StoreEvent::Destroyed { id } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::notification::{Content, Lifetime, Position};
    use crate::notifications::timer::Countdown;
    use std::collections::HashSet;
    use std::time::Duration;

    fn item(duration: Lifetime) -> Notification {
        Notification {
            id: NotificationId::new(),
            kind: NotificationType::Info,
            state: State::Incoming,
            content: Content::default(),
            duration,
            countdown: Countdown::default(),
            position: Position::default(),
            created_at: 0,
            duplicate_count: 0,
            skip_queue: false,
            pause_sources: HashSet::new(),
        }
    }

    #[test]
    fn admission_edges() {
        assert_eq!(
            transition(State::Incoming, Event::SlotAvailable),
            Some(State::Visible)
        );
        assert_eq!(
            transition(State::Incoming, Event::NoSlot),
            Some(State::Queued)
        );
        assert_eq!(
            transition(State::Queued, Event::SlotAvailable),
            Some(State::Visible)
        );
        assert_eq!(transition(State::Queued, Event::NoSlot), None);
    }

    #[test]
    fn pause_resume_is_the_only_reversible_pair() {
        assert_eq!(transition(State::Visible, Event::Pause), Some(State::Paused));
        assert_eq!(transition(State::Paused, Event::Resume), Some(State::Visible));
        assert_eq!(transition(State::Paused, Event::Pause), None);
        assert_eq!(transition(State::Visible, Event::Resume), None);
        assert_eq!(transition(State::Clearing, Event::SlotAvailable), None);
    }

    #[test]
    fn clearing_sources() {
        for event in [Event::Expire, Event::Clear, Event::ClearAll] {
            assert_eq!(transition(State::Visible, event), Some(State::Clearing));
            assert_eq!(transition(State::Paused, event), Some(State::Clearing));
            assert_eq!(transition(State::Queued, event), None);
            assert_eq!(transition(State::Clearing, event), None);
        }
        assert_eq!(
            transition(State::Clearing, Event::AnimationEnd),
            Some(State::Destroyed)
        );
    }

    #[test]
    fn destroy_from_any_live_state() {
        for state in [
            State::Incoming,
            State::Queued,
            State::Visible,
            State::Paused,
            State::Clearing,
        ] {
            assert_eq!(transition(state, Event::Destroy), Some(State::Destroyed));
        }
        assert_eq!(transition(State::Destroyed, Event::Destroy), None);
    }

    #[test]
    fn apply_starts_and_cancels_countdown() {
        let t0 = Instant::now();
        let mut n = item(Lifetime::from_millis(100));

        apply(&mut n, Event::SlotAvailable, t0);
        assert_eq!(n.state, State::Visible);
        assert_eq!(n.countdown.deadline(), Some(t0 + Duration::from_millis(100)));

        apply(&mut n, Event::Clear, t0);
        assert_eq!(n.state, State::Clearing);
        assert!(!n.countdown.is_armed());
    }

    #[test]
    fn apply_pause_requires_running_countdown() {
        let t0 = Instant::now();
        let mut n = item(Lifetime::Infinite);
        apply(&mut n, Event::SlotAvailable, t0);

        assert_eq!(apply(&mut n, Event::Pause, t0), None);
        assert_eq!(n.state, State::Visible);
    }

    #[test]
    fn restart_can_keep_item_frozen() {
        let t0 = Instant::now();
        let mut n = item(Lifetime::from_millis(500));
        apply(&mut n, Event::SlotAvailable, t0);
        apply(&mut n, Event::Pause, t0);

        restart(&mut n, t0 + Duration::from_secs(9), true);
        assert_eq!(n.state, State::Paused);
        assert_eq!(
            n.countdown.remaining(t0 + Duration::from_secs(60)),
            Some(Duration::from_millis(500))
        );
    }
}
