// SPDX-License-Identifier: MPL-2.0
//! Async driver for the notification store.
//!
//! The [`Notifier`] owns the [`Store`] behind a mutex and runs one tokio task
//! that sleeps until the earliest countdown deadline, then ticks the store.
//! Every facade call wakes the task, because a push, pause or resume may
//! move that deadline. Each call runs to completion under the lock, so
//! timer expiry and host events never interleave inside a store operation.
//!
//! Time comes from [`tokio::time::Instant`], so tests can run on a paused
//! clock.

use crate::config::Config;
use crate::error::Result;
use crate::notifications::{Message, Push, Store, StoreEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Current instant on the tokio clock.
pub(crate) fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// State shared between the facade, handles and the driver task.
pub(crate) struct Shared {
    store: Mutex<Store>,
    wake: Notify,
    /// Set when the owning notifier is dropped.
    closed: AtomicBool,
}

impl Shared {
    pub(crate) fn new(config: Config) -> Result<Self> {
        Ok(Self {
            store: Mutex::new(Store::new(config)?),
            wake: Notify::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Upgrades a facade or handle reference while the notifier is alive.
    pub(crate) fn upgrade(shared: &Weak<Shared>) -> Option<Arc<Shared>> {
        shared
            .upgrade()
            .filter(|shared| !shared.closed.load(Ordering::Acquire))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("notification store mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Runs a mutation with the current instant, then wakes the driver.
    pub(crate) fn with_store<R>(&self, f: impl FnOnce(&mut Store, Instant) -> R) -> R {
        let out = f(&mut self.lock(), now());
        self.wake.notify_one();
        out
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        f(&self.lock())
    }
}

/// Runs a store and its expiry driver.
///
/// Dropping the notifier stops the driver. Every [`Push`] clone and handle
/// created from it turns into a no-op at the same time.
pub struct Notifier {
    shared: Arc<Shared>,
    driver: JoinHandle<()>,
}

impl Notifier {
    /// Validates `config`, creates the store and spawns the driver task.
    ///
    /// # Errors
    ///
    /// Returns an error when `config` is invalid.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn(config: Config) -> Result<Self> {
        let shared = Arc::new(Shared::new(config)?);
        let driver = tokio::spawn(drive(Arc::clone(&shared)));
        debug!("notification driver started");
        Ok(Self { shared, driver })
    }

    /// Returns a push facade bound to this notifier.
    #[must_use]
    pub fn push(&self) -> Push {
        Push::new(&self.shared)
    }

    /// Subscribes to lifecycle hooks.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreEvent> {
        self.shared.with_store(|store, _| store.subscribe())
    }

    /// Forwards a renderer or host message to the store.
    pub fn send(&self, message: Message) {
        self.shared
            .with_store(|store, now| store.handle_message(&message, now));
    }

    /// Reads the store under the lock.
    pub fn inspect<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        self.shared.read(f)
    }

    /// Replaces the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error and keeps the previous configuration when `config`
    /// is invalid.
    pub fn set_config(&self, config: Config) -> Result<()> {
        self.shared
            .with_store(|store, now| store.set_config(config, now))
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.shared.close();
        self.driver.abort();
        debug!("notification driver stopped");
    }
}

async fn drive(shared: Arc<Shared>) {
    loop {
        let deadline = shared.read(Store::next_deadline);
        match deadline {
            Some(deadline) => {
                tokio::select! {
                    () = tokio::time::sleep_until(deadline.into()) => {
                        let expired = shared.lock().tick(now());
                        trace!(count = expired.len(), "driver tick");
                    }
                    () = shared.wake.notified() => {}
                }
            }
            None => shared.wake.notified().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{Lifetime, PauseTrigger, PushOptions};
    use std::time::Duration;

    fn quick_config() -> Config {
        let mut config = Config::default();
        config.animations.leave = String::new();
        config
    }

    /// Timer wheel resolution is one millisecond per sleep.
    fn assert_elapsed(start: tokio::time::Instant, expected_ms: u64) {
        let elapsed = start.elapsed();
        let expected = Duration::from_millis(expected_ms);
        assert!(
            elapsed >= expected && elapsed <= expected + Duration::from_millis(3),
            "elapsed {elapsed:?}, expected {expected:?}"
        );
    }

    fn lasting(ms: u64) -> PushOptions {
        PushOptions::new()
            .with_message("tick")
            .with_duration(Lifetime::from_millis(ms))
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_fires_on_the_deadline() {
        let notifier = Notifier::spawn(quick_config()).unwrap();
        let push = notifier.push();
        let mut count = push.count();
        let start = tokio::time::Instant::now();

        push.info(lasting(1000));
        assert_eq!(*count.borrow_and_update(), 1);

        count.wait_for(|c| *c == 0).await.unwrap();
        assert_elapsed(start, 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_time_does_not_count() {
        let notifier = Notifier::spawn(quick_config()).unwrap();
        let push = notifier.push();
        let mut count = push.count();
        let start = tokio::time::Instant::now();

        push.info(lasting(1000));
        tokio::time::sleep(Duration::from_millis(300)).await;
        push.pause_all(PauseTrigger::Hover);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*count.borrow(), 1);
        push.resume_all(PauseTrigger::Hover);

        count.wait_for(|c| *c == 0).await.unwrap();
        assert_elapsed(start, 1600);
    }

    #[tokio::test(start_paused = true)]
    async fn later_push_with_earlier_deadline_wakes_driver() {
        let notifier = Notifier::spawn(quick_config()).unwrap();
        let push = notifier.push();
        let mut events = push.subscribe();

        let slow = push.info(lasting(10_000));
        tokio::task::yield_now().await;
        let fast = push.info(lasting(100));

        let start = tokio::time::Instant::now();
        loop {
            match events.recv().await {
                Some(StoreEvent::Destroyed { id }) => {
                    assert_eq!(id, fast.id());
                    break;
                }
                Some(_) => {}
                None => panic!("event stream closed"),
            }
        }
        assert_elapsed(start, 100);
        assert!(notifier.inspect(|store| store.get(slow.id()).is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_all_leaves_nothing_to_expire() {
        let notifier = Notifier::spawn(Config::default()).unwrap();
        let push = notifier.push();
        for _ in 0..3 {
            push.info(lasting(100));
        }
        let mut events = push.subscribe();

        push.destroy_all();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(seen.len(), 3);
        assert!(seen
            .iter()
            .all(|e| matches!(e, StoreEvent::Destroyed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn renderer_finishes_clearing() {
        let notifier = Notifier::spawn(Config::default()).unwrap();
        let push = notifier.push();
        let mut events = push.subscribe();
        let handle = push.info(lasting(50));

        let cleared = loop {
            if let Some(StoreEvent::Clearing { id, animation }) = events.recv().await {
                assert!(!animation.is_empty());
                break id;
            }
        };
        assert_eq!(cleared, handle.id());
        assert_eq!(*push.count().borrow(), 1);

        notifier.send(Message::AnimationEnd(cleared));
        assert_eq!(*push.count().borrow(), 0);
    }

    #[tokio::test]
    async fn facade_goes_inert_when_notifier_drops() {
        let notifier = Notifier::spawn(Config::default()).unwrap();
        let push = notifier.push();
        let live_count = push.count();
        let kept = push.info(lasting(60_000));
        assert_eq!(*live_count.borrow(), 1);

        drop(notifier);
        let late = push.info("after drop");
        late.destroy();
        kept.destroy();

        assert_eq!(*live_count.borrow(), 1);
        assert_eq!(*push.count().borrow(), 0);
        assert!(!*push.is_enabled().borrow());
    }

    #[tokio::test]
    async fn spawn_rejects_invalid_config() {
        let mut config = Config::default();
        config.layout.max_visible = Some(0);
        assert!(Notifier::spawn(config).is_err());
    }
}
