// SPDX-License-Identifier: MPL-2.0
//! `toast_scheduler` is a headless toast notification store and scheduler.
//!
//! It keeps the authoritative list of notifications, decides which ones are
//! visible in each screen position, queues the overflow and runs per-item
//! countdowns that can be paused and resumed without losing time. Rendering
//! is left to the host, which follows the lifecycle hooks the store emits.

#![doc(html_root_url = "https://docs.rs/toast_scheduler/0.3.0")]

pub mod config;
pub mod error;
pub mod notifications;
pub mod runtime;

pub use error::{Error, Result};
pub use runtime::Notifier;
