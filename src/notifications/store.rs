// SPDX-License-Identifier: MPL-2.0
//! Notification store: the authoritative collection and its scheduler.
//!
//! The `Store` owns every live notification, partitions each position into
//! visible and queued items, and drives the per-item countdowns. It is a
//! synchronous state machine: every operation takes the current instant and
//! runs to completion, so callers decide where time comes from (the
//! [`Notifier`](crate::runtime::Notifier) runtime in production, fixed
//! instants in tests).
//!
//! Operations naming an unknown id are silent no-ops. A notification may
//! destroy itself between a caller obtaining its id and using it.

use super::lifecycle::{self, Event, PauseTrigger, State, StoreEvent};
use super::notification::{Content, Lifetime, Notification, NotificationId, NotificationType, Position};
use super::timer::Countdown;
use crate::config::Config;
use crate::error::Result;
use std::collections::HashSet;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};

/// A normalized creation or update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRequest {
    pub id: NotificationId,
    pub kind: NotificationType,
    pub content: Content,
    pub duration: Lifetime,
    pub position: Position,
    /// Admit immediately even when the position is at its visible cap.
    pub skip_queue: bool,
}

/// Per-item operations reachable through a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemMethod {
    Clear,
    Destroy,
}

/// Messages sent back by renderers and host event sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Clear(NotificationId),
    Destroy(NotificationId),
    Pause(NotificationId, PauseTrigger),
    Resume(NotificationId, PauseTrigger),
    /// Pause every countdown, e.g. pointer entered the notification stream.
    PauseAll(PauseTrigger),
    ResumeAll(PauseTrigger),
    /// Exit animation finished.
    AnimationEnd(NotificationId),
    /// Fire expired countdowns.
    Tick,
}

pub struct Store {
    config: Config,
    /// Live items in creation order.
    items: Vec<Notification>,
    next_seq: u64,
    /// Stream-wide pause sources currently active.
    stream_pauses: HashSet<PauseTrigger>,
    enabled: watch::Sender<bool>,
    count: watch::Sender<usize>,
    has_items: watch::Sender<bool>,
    listeners: Vec<mpsc::UnboundedSender<StoreEvent>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("items", &self.items)
            .field("enabled", &*self.enabled.borrow())
            .field("stream_pauses", &self.stream_pauses)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Creates an empty, enabled store.
    ///
    /// # Errors
    ///
    /// Returns an error when `config` fails [`Config::validate`].
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let (enabled, _) = watch::channel(true);
        let (count, _) = watch::channel(0);
        let (has_items, _) = watch::channel(false);
        Ok(Self {
            config,
            items: Vec::new(),
            next_seq: 0,
            stream_pauses: HashSet::new(),
            enabled,
            count,
            has_items,
            listeners: Vec::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Swaps the configuration and re-runs admission everywhere, so a raised
    /// visible cap promotes queued items right away.
    ///
    /// # Errors
    ///
    /// Returns an error and keeps the old configuration when `config` is invalid.
    pub fn set_config(&mut self, config: Config, now: Instant) -> Result<()> {
        config.validate()?;
        self.config = config;
        for position in Position::ALL {
            self.admit(position, now);
        }
        Ok(())
    }

    // =========================================================================
    // Observables
    // =========================================================================

    /// Subscribes to lifecycle hooks.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StoreEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.push(tx);
        rx
    }

    /// Watches the enable gate.
    #[must_use]
    pub fn is_enabled(&self) -> watch::Receiver<bool> {
        self.enabled.subscribe()
    }

    /// Watches the number of live items.
    #[must_use]
    pub fn count(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }

    /// Watches `count > 0`.
    #[must_use]
    pub fn has_items(&self) -> watch::Receiver<bool> {
        self.has_items.subscribe()
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        *self.enabled.borrow()
    }

    /// Number of live items (every state except destroyed).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    /// Returns all live items in render order.
    pub fn items(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    /// Returns the items occupying a slot in `position`, clearing ones included.
    pub fn visible(&self, position: Position) -> impl Iterator<Item = &Notification> {
        self.items
            .iter()
            .filter(move |n| n.position == position && occupies_slot(n.state))
    }

    #[must_use]
    pub fn visible_count(&self, position: Position) -> usize {
        self.visible(position).count()
    }

    #[must_use]
    pub fn queued_count(&self, position: Position) -> usize {
        self.items
            .iter()
            .filter(|n| n.position == position && n.state == State::Queued)
            .count()
    }

    /// Returns whether any stream-wide pause is active.
    #[must_use]
    pub fn is_stream_paused(&self) -> bool {
        !self.stream_pauses.is_empty()
    }

    /// Earliest instant at which a running countdown expires.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.items.iter().filter_map(|n| n.countdown.deadline()).min()
    }

    // =========================================================================
    // Gate
    // =========================================================================

    pub fn enable(&mut self) {
        if set_if_changed(&self.enabled, true) {
            debug!("notifications enabled");
        }
    }

    /// Drops every subsequent `set_incoming` until [`Store::enable`].
    pub fn disable(&mut self) {
        if set_if_changed(&self.enabled, false) {
            debug!("notifications disabled");
        }
    }

    // =========================================================================
    // Creation and update
    // =========================================================================

    /// Applies a creation or update request.
    ///
    /// An existing id updates that item in place; otherwise a new item is
    /// inserted and admission runs for its position. Returns the id the
    /// request ended up on, which differs from `request.id` when the push was
    /// folded into a duplicate. Returns `None` when the store is disabled, or
    /// when a resolve/reject names an item that no longer exists.
    pub fn set_incoming(
        &mut self,
        request: IncomingRequest,
        now: Instant,
    ) -> Option<NotificationId> {
        if !self.enabled() {
            debug!(id = %request.id, "store disabled, dropping push");
            return None;
        }

        if let Some(idx) = self.index_of(request.id) {
            self.update_in_place(idx, request, now);
            return Some(self.items[idx].id);
        }

        if request.kind.is_promise_result() {
            trace!(id = %request.id, kind = %request.kind, "settling a notification that is gone");
            return None;
        }

        if self.config.layout.avoid_duplicates && !request.kind.is_promise_family() {
            if let Some(id) = self.fold_duplicate(&request, now) {
                return Some(id);
            }
        }

        let id = request.id;
        let position = request.position;
        self.items.push(Notification {
            id,
            kind: request.kind,
            state: State::Incoming,
            content: request.content,
            duration: request.duration,
            countdown: Countdown::default(),
            position,
            created_at: self.next_seq,
            duplicate_count: 0,
            skip_queue: request.skip_queue,
            pause_sources: HashSet::new(),
        });
        self.next_seq += 1;
        self.sync_count();
        debug!(%id, kind = %request.kind, ?position, "notification created");

        self.admit(position, now);
        Some(id)
    }

    fn update_in_place(&mut self, idx: usize, request: IncomingRequest, now: Instant) {
        let keep_paused = self.items[idx].state == State::Paused
            || self.items[idx].is_held()
            || self.is_stream_paused();
        let item = &mut self.items[idx];
        if item.state.is_leaving() {
            trace!(id = %item.id, "ignoring update for leaving notification");
            return;
        }

        item.kind = request.kind;
        item.content = request.content;
        item.duration = request.duration;
        if item.state.is_active() {
            lifecycle::restart(item, now, keep_paused);
        }

        let (id, kind) = (item.id, item.kind);
        debug!(%id, %kind, "notification updated in place");
        self.emit(StoreEvent::Updated { id, kind });
    }

    fn fold_duplicate(&mut self, request: &IncomingRequest, now: Instant) -> Option<NotificationId> {
        let keep_paused = self.is_stream_paused();
        let item = self.items.iter_mut().find(|n| {
            n.position == request.position
                && !n.state.is_leaving()
                && n.matches(request.kind, &request.content)
        })?;

        item.duplicate_count += 1;
        if item.state.is_active() {
            let keep_paused = keep_paused || item.state == State::Paused || item.is_held();
            lifecycle::restart(item, now, keep_paused);
        }

        let (id, count) = (item.id, item.duplicate_count);
        debug!(%id, count, "duplicate folded");
        self.emit(StoreEvent::Duplicated { id, count });
        Some(id)
    }

    // =========================================================================
    // Admission
    // =========================================================================

    /// Promotes waiting items of `position` in creation order while slots are
    /// free. Overflow is queued, or makes room by destroying the oldest
    /// visible item when queueing is off.
    fn admit(&mut self, position: Position, now: Instant) {
        let limit = self.config.layout.max_visible.unwrap_or(usize::MAX);
        let mut occupied = self.visible_count(position);
        let waiting: Vec<NotificationId> = self
            .items
            .iter()
            .filter(|n| n.position == position && n.state.is_waiting())
            .map(|n| n.id)
            .collect();

        for id in waiting {
            let Some(idx) = self.index_of(id) else {
                continue;
            };
            let item = &self.items[idx];

            if !item.skip_queue && occupied >= limit {
                if item.state == State::Queued {
                    continue;
                }
                if self.config.layout.enqueue || !self.evict_oldest_active(position) {
                    lifecycle::apply(&mut self.items[idx], Event::NoSlot, now);
                    trace!(%id, ?position, "notification queued");
                    self.emit(StoreEvent::Queued { id });
                    continue;
                }
                occupied -= 1;
            }

            let Some(idx) = self.index_of(id) else {
                continue;
            };
            lifecycle::apply(&mut self.items[idx], Event::SlotAvailable, now);
            occupied += 1;
            debug!(%id, ?position, "notification visible");
            self.emit(StoreEvent::Admitted {
                id,
                animation: self.config.animations.enter.clone(),
            });

            if (self.is_stream_paused() || self.items[idx].is_held())
                && lifecycle::apply(&mut self.items[idx], Event::Pause, now).is_some()
            {
                self.emit(StoreEvent::Paused { id });
            }
        }
    }

    fn evict_oldest_active(&mut self, position: Position) -> bool {
        let Some(idx) = self
            .items
            .iter()
            .position(|n| n.position == position && n.state.is_active())
        else {
            return false;
        };
        debug!(id = %self.items[idx].id, "evicting oldest notification to make room");
        self.evict(idx);
        true
    }

    // =========================================================================
    // Clearing and destruction
    // =========================================================================

    pub fn call_item_method(&mut self, id: NotificationId, method: ItemMethod, now: Instant) {
        match method {
            ItemMethod::Clear => self.clear(id, now),
            ItemMethod::Destroy => self.destroy(id, now),
        }
    }

    /// Starts the exit transition. Waiting items were never shown, so they
    /// are removed directly.
    pub fn clear(&mut self, id: NotificationId, now: Instant) {
        let Some(idx) = self.index_of(id) else {
            trace!(%id, "clear on unknown notification");
            return;
        };
        if self.items[idx].state.is_waiting() {
            self.evict(idx);
            return;
        }
        self.begin_clearing(idx, Event::Clear, now);
    }

    /// Destroys immediately, bypassing the exit animation, and promotes the
    /// next queued item of the freed position.
    pub fn destroy(&mut self, id: NotificationId, now: Instant) {
        let Some(idx) = self.index_of(id) else {
            trace!(%id, "destroy on unknown notification");
            return;
        };
        let position = self.items[idx].position;
        self.evict(idx);
        self.admit(position, now);
    }

    /// Exit animation finished: `Clearing` → `Destroyed`.
    pub fn finish_clearing(&mut self, id: NotificationId, now: Instant) {
        let Some(idx) = self.index_of(id) else {
            trace!(%id, "animation end for unknown notification");
            return;
        };
        if transition_allowed(self.items[idx].state, Event::AnimationEnd) {
            self.destroy(id, now);
        }
    }

    /// Clears every item visible or paused right now. Queued items, including
    /// ones promoted while this runs, are left alone.
    pub fn schedule_clear_all(&mut self, now: Instant) {
        let snapshot: Vec<NotificationId> = self
            .items
            .iter()
            .filter(|n| n.state.is_active())
            .map(|n| n.id)
            .collect();
        debug!(count = snapshot.len(), "clearing all visible notifications");

        for id in snapshot {
            if let Some(idx) = self.index_of(id) {
                self.begin_clearing(idx, Event::ClearAll, now);
            }
        }
    }

    /// Destroys everything in one pass and cancels every countdown.
    pub fn destroy_all(&mut self) {
        let drained: Vec<Notification> = self.items.drain(..).collect();
        debug!(count = drained.len(), "destroying all notifications");
        self.sync_count();

        for mut item in drained {
            lifecycle::destroy(&mut item);
            self.emit(StoreEvent::Destroyed { id: item.id });
        }
    }

    fn begin_clearing(&mut self, idx: usize, event: Event, now: Instant) {
        let id = self.items[idx].id;
        if lifecycle::apply(&mut self.items[idx], event, now).is_none() {
            trace!(%id, state = ?self.items[idx].state, "clear ignored");
            return;
        }

        let animations = &self.config.animations;
        let animation = if animations.leave.is_empty() {
            String::new()
        } else if event == Event::ClearAll {
            animations.clear_all.clone()
        } else {
            animations.leave.clone()
        };
        let immediate = animation.is_empty();

        debug!(%id, ?event, "notification clearing");
        self.emit(StoreEvent::Clearing { id, animation });
        if immediate {
            self.finish_clearing(id, now);
        }
    }

    /// Removes the item at `idx` from the collection.
    fn evict(&mut self, idx: usize) {
        let mut item = self.items.remove(idx);
        lifecycle::destroy(&mut item);
        self.sync_count();
        debug!(id = %item.id, "notification destroyed");
        self.emit(StoreEvent::Destroyed { id: item.id });
    }

    // =========================================================================
    // Pause / resume
    // =========================================================================

    /// Freezes one item's countdown if `trigger` is enabled in the config.
    /// The item stays held by `trigger` until the matching [`Store::resume`].
    pub fn pause(&mut self, id: NotificationId, trigger: PauseTrigger, now: Instant) {
        if !self.config.allows_pause(trigger) {
            return;
        }
        let Some(idx) = self.index_of(id) else {
            trace!(%id, "pause on unknown notification");
            return;
        };
        let item = &mut self.items[idx];
        if item.state.is_leaving() {
            return;
        }
        item.pause_sources.insert(trigger);
        if lifecycle::apply(item, Event::Pause, now).is_some() {
            self.emit(StoreEvent::Paused { id });
        }
    }

    /// Lifts `trigger` from one item. The countdown resumes once no item-level
    /// source and no stream-wide pause holds it.
    pub fn resume(&mut self, id: NotificationId, trigger: PauseTrigger, now: Instant) {
        if !self.config.allows_pause(trigger) {
            return;
        }
        let Some(idx) = self.index_of(id) else {
            trace!(%id, "resume on unknown notification");
            return;
        };
        let stream_paused = self.is_stream_paused();
        let item = &mut self.items[idx];
        item.pause_sources.remove(&trigger);
        if item.is_held() || stream_paused {
            trace!(%id, "resume deferred, still held");
            return;
        }
        if lifecycle::apply(item, Event::Resume, now).is_some() {
            self.emit(StoreEvent::Resumed { id });
        }
    }

    /// Pauses every visible countdown and keeps newly admitted items paused
    /// until the matching [`Store::resume_all`].
    pub fn pause_all(&mut self, trigger: PauseTrigger, now: Instant) {
        if !self.config.allows_pause(trigger) {
            return;
        }
        self.stream_pauses.insert(trigger);
        for idx in 0..self.items.len() {
            if lifecycle::apply(&mut self.items[idx], Event::Pause, now).is_some() {
                self.emit(StoreEvent::Paused {
                    id: self.items[idx].id,
                });
            }
        }
    }

    /// Lifts one stream-wide pause source. Countdowns resume once none
    /// remain, except on items still held by their own pause.
    pub fn resume_all(&mut self, trigger: PauseTrigger, now: Instant) {
        if !self.stream_pauses.remove(&trigger) || self.is_stream_paused() {
            return;
        }
        for idx in 0..self.items.len() {
            if self.items[idx].is_held() {
                continue;
            }
            if lifecycle::apply(&mut self.items[idx], Event::Resume, now).is_some() {
                self.emit(StoreEvent::Resumed {
                    id: self.items[idx].id,
                });
            }
        }
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Fires every countdown whose deadline is at or before `now` and starts
    /// clearing those items. Each countdown fires once.
    pub fn tick(&mut self, now: Instant) -> Vec<NotificationId> {
        let expired: Vec<NotificationId> = self
            .items
            .iter_mut()
            .filter_map(|n| n.countdown.poll_expired(now).then_some(n.id))
            .collect();

        for &id in &expired {
            trace!(%id, "countdown expired");
            if let Some(idx) = self.index_of(id) {
                self.begin_clearing(idx, Event::Expire, now);
            }
        }
        expired
    }

    /// Handles a renderer or host message.
    pub fn handle_message(&mut self, message: &Message, now: Instant) {
        match *message {
            Message::Clear(id) => self.clear(id, now),
            Message::Destroy(id) => self.destroy(id, now),
            Message::Pause(id, trigger) => self.pause(id, trigger, now),
            Message::Resume(id, trigger) => self.resume(id, trigger, now),
            Message::PauseAll(trigger) => self.pause_all(trigger, now),
            Message::ResumeAll(trigger) => self.resume_all(trigger, now),
            Message::AnimationEnd(id) => self.finish_clearing(id, now),
            Message::Tick => {
                self.tick(now);
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn index_of(&self, id: NotificationId) -> Option<usize> {
        self.items.iter().position(|n| n.id == id)
    }

    fn sync_count(&self) {
        let len = self.items.len();
        set_if_changed(&self.count, len);
        set_if_changed(&self.has_items, len > 0);
    }

    fn emit(&mut self, event: StoreEvent) {
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

fn occupies_slot(state: State) -> bool {
    state.is_active() || state == State::Clearing
}

fn transition_allowed(state: State, event: Event) -> bool {
    lifecycle::transition(state, event).is_some()
}

/// Updates a watch value, notifying receivers only on an actual change.
fn set_if_changed<T: PartialEq>(sender: &watch::Sender<T>, value: T) -> bool {
    sender.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    })
}
