// SPDX-License-Identifier: MPL-2.0
//! Toast notification store and scheduler.
//!
//! This module owns the notification data, the lifecycle state machine and
//! the per-item countdowns. It renders nothing. Renderers subscribe to
//! [`StoreEvent`]s, run their animations and report back with [`Message`]s.
//!
//! # Components
//!
//! - [`notification`] - `Notification` record, ids, types, positions, lifetimes
//! - [`timer`] - `Countdown` that survives pause/resume without drift
//! - [`lifecycle`] - `State`/`Event` transition table and store hooks
//! - [`store`] - `Store` with per-position admission and queueing
//! - [`push`] - `Push` facade, push and promise handles
//!
//! # Usage
//!
//! ```no_run
//! use toast_scheduler::config::Config;
//! use toast_scheduler::notifications::PushOptions;
//! use toast_scheduler::runtime::Notifier;
//!
//! # async fn demo() -> toast_scheduler::error::Result<()> {
//! let notifier = Notifier::spawn(Config::default())?;
//! let push = notifier.push();
//!
//! push.success("Saved");
//! let upload = push.promise(PushOptions::new().with_message("Uploading"));
//! upload.resolve("Uploaded");
//! # Ok(())
//! # }
//! ```

pub mod lifecycle;
pub mod notification;
pub mod push;
pub mod store;
pub mod timer;

pub use lifecycle::{transition, Event, PauseTrigger, State, StoreEvent};
pub use notification::{Content, Lifetime, Notification, NotificationId, NotificationType, Position};
pub use push::{normalize, PromiseHandle, Push, PushHandle, PushOptions, PushParam};
pub use store::{IncomingRequest, ItemMethod, Message, Store};
pub use timer::Countdown;
