// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! # Categories
//!
//! - **Timing**: Default visible lifetime of a notification
//! - **Layout**: Visible cap bounds
//! - **Animations**: Class names handed to renderers

// ==========================================================================
// Timing Defaults
// ==========================================================================

/// Default visible lifetime for non-promise notifications (milliseconds).
pub const DEFAULT_DURATION_MS: u64 = 6000;

// ==========================================================================
// Layout Defaults
// ==========================================================================

/// Smallest accepted per-position visible cap.
pub const MIN_MAX_VISIBLE: usize = 1;

// ==========================================================================
// Animation Defaults
// ==========================================================================

pub const DEFAULT_ENTER_ANIMATION: &str = "toast-enter";

pub const DEFAULT_LEAVE_ANIMATION: &str = "toast-leave";

pub const DEFAULT_CLEAR_ALL_ANIMATION: &str = "toast-clear-all";

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    assert!(DEFAULT_DURATION_MS > 0);
    assert!(MIN_MAX_VISIBLE > 0);
    assert!(!DEFAULT_LEAVE_ANIMATION.is_empty());
};
