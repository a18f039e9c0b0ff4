// SPDX-License-Identifier: MPL-2.0
//! Public push API.
//!
//! [`Push`] turns ergonomic call shapes (a bare message, a [`PushOptions`]
//! builder, typed shorthands, promises) into normalized
//! [`IncomingRequest`]s for the store and hands back [`PushHandle`]s.

use super::lifecycle::{PauseTrigger, StoreEvent};
use super::notification::{Content, Lifetime, NotificationId, NotificationType, Position};
use super::store::{IncomingRequest, ItemMethod, Message, Store};
use crate::config::Config;
use crate::runtime::Shared;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::trace;

/// Caller-supplied options. Unset fields take the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOptions {
    pub title: Option<String>,
    pub message: Option<String>,
    pub duration: Option<Lifetime>,
    pub position: Option<Position>,
    pub skip_queue: bool,
    pub props: BTreeMap<String, String>,
}

impl PushOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Lifetime) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Admits the notification even when its position is full.
    #[must_use]
    pub fn skip_queue(mut self) -> Self {
        self.skip_queue = true;
        self
    }

    /// Adds a renderer prop.
    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }
}

/// Accepted call shapes: a bare message or full options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushParam {
    Message(String),
    Options(PushOptions),
}

impl From<&str> for PushParam {
    fn from(message: &str) -> Self {
        PushParam::Message(message.to_string())
    }
}

impl From<String> for PushParam {
    fn from(message: String) -> Self {
        PushParam::Message(message)
    }
}

impl From<PushOptions> for PushParam {
    fn from(options: PushOptions) -> Self {
        PushParam::Options(options)
    }
}

/// Builds the store request: per-type defaults, then `global`, then the
/// caller's options. A pending promise never auto-clears, whatever the
/// configured or requested duration.
#[must_use]
pub fn normalize(
    param: PushParam,
    kind: NotificationType,
    id: NotificationId,
    config: &Config,
) -> IncomingRequest {
    let options = match param {
        PushParam::Message(message) => PushOptions::new().with_message(message),
        PushParam::Options(options) => options,
    };
    let defaults = config.notifications.resolve(kind);

    IncomingRequest {
        id,
        kind,
        content: Content {
            title: options.title.unwrap_or(defaults.title),
            message: options.message.unwrap_or(defaults.message),
            props: options.props,
        },
        duration: if kind == NotificationType::Promise {
            Lifetime::Infinite
        } else {
            options.duration.unwrap_or(defaults.duration)
        },
        position: options.position.unwrap_or(config.layout.position),
        skip_queue: options.skip_queue,
    }
}

fn create(
    shared: &Arc<Shared>,
    param: PushParam,
    kind: NotificationType,
    id: NotificationId,
) -> PushHandle {
    let effective = shared.with_store(|store, now| {
        let request = normalize(param, kind, id, store.config());
        store.set_incoming(request, now)
    });
    PushHandle {
        id: effective.unwrap_or(id),
        shared: Arc::downgrade(shared),
    }
}

/// The push facade. Cheap to clone.
///
/// Holds a weak reference to the notifier's store. Once the
/// [`Notifier`](crate::runtime::Notifier) is dropped, pushes are discarded
/// and the observables report an empty, disabled store.
#[derive(Clone)]
pub struct Push {
    shared: Weak<Shared>,
}

impl std::fmt::Debug for Push {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Push").finish_non_exhaustive()
    }
}

impl Push {
    pub(crate) fn new(shared: &Arc<Shared>) -> Self {
        Self {
            shared: Arc::downgrade(shared),
        }
    }

    /// Pushes a success notification.
    pub fn push(&self, param: impl Into<PushParam>) -> PushHandle {
        self.success(param)
    }

    pub fn success(&self, param: impl Into<PushParam>) -> PushHandle {
        self.create(param, NotificationType::Success)
    }

    pub fn error(&self, param: impl Into<PushParam>) -> PushHandle {
        self.create(param, NotificationType::Error)
    }

    pub fn warning(&self, param: impl Into<PushParam>) -> PushHandle {
        self.create(param, NotificationType::Warning)
    }

    pub fn info(&self, param: impl Into<PushParam>) -> PushHandle {
        self.create(param, NotificationType::Info)
    }

    /// Pushes a pending promise notification. Settle it through the handle.
    pub fn promise(&self, param: impl Into<PushParam>) -> PromiseHandle {
        PromiseHandle {
            handle: self.create(param, NotificationType::Promise),
        }
    }

    fn create(&self, param: impl Into<PushParam>, kind: NotificationType) -> PushHandle {
        let id = NotificationId::new();
        match Shared::upgrade(&self.shared) {
            Some(shared) => create(&shared, param.into(), kind, id),
            None => {
                trace!(%id, "notifier dropped, discarding push");
                PushHandle {
                    id,
                    shared: Weak::new(),
                }
            }
        }
    }

    fn update(&self, f: impl FnOnce(&mut Store, Instant)) {
        if let Some(shared) = Shared::upgrade(&self.shared) {
            shared.with_store(f);
        }
    }

    fn observe<T>(&self, f: impl FnOnce(&Store) -> watch::Receiver<T>, idle: T) -> watch::Receiver<T> {
        match Shared::upgrade(&self.shared) {
            Some(shared) => shared.read(f),
            None => watch::channel(idle).1,
        }
    }

    pub fn clear_all(&self) {
        self.update(|store, now| store.schedule_clear_all(now));
    }

    pub fn destroy_all(&self) {
        self.update(|store, _| store.destroy_all());
    }

    pub fn enable(&self) {
        self.update(|store, _| store.enable());
    }

    pub fn disable(&self) {
        self.update(|store, _| store.disable());
    }

    pub fn pause(&self, id: NotificationId, trigger: PauseTrigger) {
        self.send(Message::Pause(id, trigger));
    }

    pub fn resume(&self, id: NotificationId, trigger: PauseTrigger) {
        self.send(Message::Resume(id, trigger));
    }

    pub fn pause_all(&self, trigger: PauseTrigger) {
        self.send(Message::PauseAll(trigger));
    }

    pub fn resume_all(&self, trigger: PauseTrigger) {
        self.send(Message::ResumeAll(trigger));
    }

    /// Forwards a renderer or host message to the store.
    pub fn send(&self, message: Message) {
        self.update(|store, now| store.handle_message(&message, now));
    }

    #[must_use]
    pub fn is_enabled(&self) -> watch::Receiver<bool> {
        self.observe(Store::is_enabled, false)
    }

    #[must_use]
    pub fn count(&self) -> watch::Receiver<usize> {
        self.observe(Store::count, 0)
    }

    #[must_use]
    pub fn has_items(&self) -> watch::Receiver<bool> {
        self.observe(Store::has_items, false)
    }

    /// Subscribes to lifecycle hooks. The stream is closed right away when
    /// the notifier is gone.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreEvent> {
        match Shared::upgrade(&self.shared) {
            Some(shared) => shared.with_store(|store, _| store.subscribe()),
            None => mpsc::unbounded_channel().1,
        }
    }
}

/// Handle to one pushed notification.
///
/// Stays usable for the life of the process. Once the notification is gone,
/// or the notifier has been dropped, `clear` and `destroy` do nothing.
#[derive(Debug, Clone)]
pub struct PushHandle {
    id: NotificationId,
    shared: Weak<Shared>,
}

impl PushHandle {
    #[must_use]
    pub fn id(&self) -> NotificationId {
        self.id
    }

    pub fn clear(&self) {
        self.call(ItemMethod::Clear);
    }

    pub fn destroy(&self) {
        self.call(ItemMethod::Destroy);
    }

    fn call(&self, method: ItemMethod) {
        if let Some(shared) = Shared::upgrade(&self.shared) {
            let id = self.id;
            shared.with_store(|store, now| store.call_item_method(id, method, now));
        }
    }
}

/// Handle to a pending promise notification.
///
/// `resolve` and `reject` consume the handle, so each handle settles at most
/// once. The store itself applies every resolve/reject it receives, last one
/// winning.
#[derive(Debug, Clone)]
pub struct PromiseHandle {
    handle: PushHandle,
}

impl PromiseHandle {
    #[must_use]
    pub fn id(&self) -> NotificationId {
        self.handle.id
    }

    /// Rewrites the notification as a success and restarts its countdown.
    pub fn resolve(self, param: impl Into<PushParam>) -> PushHandle {
        self.settle(param.into(), NotificationType::PromiseResolve)
    }

    /// Rewrites the notification as a failure and restarts its countdown.
    pub fn reject(self, param: impl Into<PushParam>) -> PushHandle {
        self.settle(param.into(), NotificationType::PromiseReject)
    }

    pub fn clear(&self) {
        self.handle.clear();
    }

    pub fn destroy(&self) {
        self.handle.destroy();
    }

    fn settle(self, param: PushParam, kind: NotificationType) -> PushHandle {
        match Shared::upgrade(&self.handle.shared) {
            Some(shared) => create(&shared, param, kind, self.handle.id),
            None => self.handle,
        }
    }
}
