// SPDX-License-Identifier: MPL-2.0
//! This module handles the scheduler's configuration, including loading and saving
//! it from a `settings.toml` file.
//!
//! # Configuration Sections
//!
//! - `[behavior]` - Which host events may pause countdowns
//! - `[layout]` - Default position, visible cap, queueing and duplicate policy
//! - `[animations]` - Enter/leave class names handed to renderers
//! - `[notifications.<type>]` / `[notifications.global]` - Per-type defaults
//!
//! # Path Resolution
//!
//! 1. Use `load_from_path()`/`save_to_path()` with explicit path
//! 2. Set `TOAST_SCHEDULER_CONFIG_DIR` environment variable
//! 3. Falls back to platform-specific config directory
//!
//! # Examples
//!
//! ```no_run
//! use toast_scheduler::config::{self, Config};
//!
//! let (mut config, _warning) = config::load();
//! config.layout.max_visible = Some(3);
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use crate::notifications::{Lifetime, NotificationType, Position};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "ToastScheduler";

/// Environment variable to override the config directory.
pub const ENV_CONFIG_DIR: &str = "TOAST_SCHEDULER_CONFIG_DIR";

// =============================================================================
// Section Structs
// =============================================================================

/// Host events allowed to pause countdowns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BehaviorConfig {
    #[serde(default = "default_true")]
    pub pause_on_hover: bool,

    #[serde(default = "default_true")]
    pub pause_on_touch: bool,

    /// Pause every countdown while the host window is hidden.
    #[serde(default = "default_true")]
    pub pause_on_tab_change: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            pause_on_hover: true,
            pause_on_touch: true,
            pause_on_tab_change: true,
        }
    }
}

/// Placement and admission policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Position used when a push does not name one.
    #[serde(default)]
    pub position: Position,

    /// Maximum visible items per position. `None` means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_visible: Option<usize>,

    /// Queue overflow (true) or make room by destroying the oldest visible item (false).
    #[serde(default = "default_true")]
    pub enqueue: bool,

    /// Fold pushes matching a live item's type, title and message into it.
    #[serde(default)]
    pub avoid_duplicates: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            position: Position::default(),
            max_visible: None,
            enqueue: true,
            avoid_duplicates: false,
        }
    }
}

/// Animation class names. An empty `leave` skips the exit animation, so
/// clearing destroys immediately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnimationConfig {
    #[serde(default = "default_enter_animation")]
    pub enter: String,

    #[serde(default = "default_leave_animation")]
    pub leave: String,

    #[serde(default = "default_clear_all_animation")]
    pub clear_all: String,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            enter: default_enter_animation(),
            leave: default_leave_animation(),
            clear_all: default_clear_all_animation(),
        }
    }
}

/// Optional per-type fields. Unset fields fall through to the next layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TypeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Lifetime>,
}

impl TypeOptions {
    fn with_duration(duration: Lifetime) -> Self {
        Self {
            duration: Some(duration),
            ..Self::default()
        }
    }
}

/// Per-type defaults plus a `global` layer applied on top of them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationsConfig {
    #[serde(default = "default_finite")]
    pub success: TypeOptions,
    #[serde(default = "default_finite")]
    pub error: TypeOptions,
    #[serde(default = "default_finite")]
    pub warning: TypeOptions,
    #[serde(default = "default_finite")]
    pub info: TypeOptions,
    #[serde(default = "default_infinite")]
    pub promise: TypeOptions,
    #[serde(default = "default_finite")]
    pub promise_resolve: TypeOptions,
    #[serde(default = "default_finite")]
    pub promise_reject: TypeOptions,
    /// Overrides every per-type entry.
    #[serde(default)]
    pub global: TypeOptions,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            success: default_finite(),
            error: default_finite(),
            warning: default_finite(),
            info: default_finite(),
            promise: default_infinite(),
            promise_resolve: default_finite(),
            promise_reject: default_finite(),
            global: TypeOptions::default(),
        }
    }
}

/// Fully merged defaults for one notification type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDefaults {
    pub title: String,
    pub message: String,
    pub duration: Lifetime,
}

impl NotificationsConfig {
    #[must_use]
    pub fn for_type(&self, kind: NotificationType) -> &TypeOptions {
        match kind {
            NotificationType::Success => &self.success,
            NotificationType::Error => &self.error,
            NotificationType::Warning => &self.warning,
            NotificationType::Info => &self.info,
            NotificationType::Promise => &self.promise,
            NotificationType::PromiseResolve => &self.promise_resolve,
            NotificationType::PromiseReject => &self.promise_reject,
        }
    }

    /// Merges the type entry with `global` (global wins).
    #[must_use]
    pub fn resolve(&self, kind: NotificationType) -> ResolvedDefaults {
        let typed = self.for_type(kind);
        let global = &self.global;
        ResolvedDefaults {
            title: global
                .title
                .clone()
                .or_else(|| typed.title.clone())
                .unwrap_or_default(),
            message: global
                .message
                .clone()
                .or_else(|| typed.message.clone())
                .unwrap_or_default(),
            duration: global
                .duration
                .or(typed.duration)
                .unwrap_or(Lifetime::from_millis(DEFAULT_DURATION_MS)),
        }
    }
}

// =============================================================================
// Main Config Struct (Sectioned)
// =============================================================================

/// Scheduler configuration with logical sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub behavior: BehaviorConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub animations: AnimationConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl Config {
    /// Rejects settings that can only come from programmer or user error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when `max_visible` is below
    /// [`MIN_MAX_VISIBLE`].
    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.layout.max_visible {
            if limit < MIN_MAX_VISIBLE {
                return Err(Error::InvalidConfig(format!(
                    "layout.max_visible must be at least {MIN_MAX_VISIBLE}, got {limit}"
                )));
            }
        }
        Ok(())
    }

    /// Returns whether `trigger` may pause countdowns.
    #[must_use]
    pub fn allows_pause(&self, trigger: crate::notifications::PauseTrigger) -> bool {
        use crate::notifications::PauseTrigger;
        match trigger {
            PauseTrigger::Hover => self.behavior.pause_on_hover,
            PauseTrigger::Touch => self.behavior.pause_on_touch,
            PauseTrigger::Visibility => self.behavior.pause_on_tab_change,
            PauseTrigger::Manual => true,
        }
    }
}

// =============================================================================
// Default Value Functions
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_enter_animation() -> String {
    DEFAULT_ENTER_ANIMATION.to_string()
}

fn default_leave_animation() -> String {
    DEFAULT_LEAVE_ANIMATION.to_string()
}

fn default_clear_all_animation() -> String {
    DEFAULT_CLEAR_ALL_ANIMATION.to_string()
}

fn default_finite() -> TypeOptions {
    TypeOptions::with_duration(Lifetime::from_millis(DEFAULT_DURATION_MS))
}

fn default_infinite() -> TypeOptions {
    TypeOptions::with_duration(Lifetime::Infinite)
}

// =============================================================================
// Config Path Resolution
// =============================================================================

/// Returns the config directory, honouring an explicit override first and
/// then [`ENV_CONFIG_DIR`].
fn config_dir_with_override(base_dir: Option<PathBuf>) -> Option<PathBuf> {
    if base_dir.is_some() {
        return base_dir;
    }
    if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR) {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path
    })
}

fn get_config_path_with_override(base_dir: Option<PathBuf>) -> Option<PathBuf> {
    config_dir_with_override(base_dir).map(|mut path| {
        path.push(CONFIG_FILE);
        path
    })
}

// =============================================================================
// Load Functions
// =============================================================================

/// Loads the configuration from the default path.
///
/// Returns a tuple of (config, optional_warning). If loading fails, returns
/// default config with a warning message explaining what went wrong.
pub fn load() -> (Config, Option<String>) {
    load_with_override(None)
}

/// Loads the configuration from a custom directory.
pub fn load_with_override(base_dir: Option<PathBuf>) -> (Config, Option<String>) {
    if let Some(path) = get_config_path_with_override(base_dir) {
        if path.exists() {
            match load_from_path(&path) {
                Ok(config) => return (config, None),
                Err(err) => {
                    tracing::warn!("falling back to default config: {err}");
                    return (Config::default(), Some(err.to_string()));
                }
            }
        }
    }
    (Config::default(), None)
}

/// Loads and validates configuration from a specific path.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

// =============================================================================
// Save Functions
// =============================================================================

/// Saves the configuration to the default path.
pub fn save(config: &Config) -> Result<()> {
    save_with_override(config, None)
}

/// Saves the configuration to a custom directory.
pub fn save_with_override(config: &Config, base_dir: Option<PathBuf>) -> Result<()> {
    if let Some(path) = get_config_path_with_override(base_dir) {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Saves configuration to a specific path.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config).map_err(Error::from)?;
    fs::write(path, content)?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::PauseTrigger;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip_preserves_settings() {
        let mut config = Config::default();
        config.behavior.pause_on_touch = false;
        config.layout.position = Position::BottomRight;
        config.layout.max_visible = Some(4);
        config.layout.avoid_duplicates = true;
        config.animations.leave = String::new();
        config.notifications.error.duration = Some(Lifetime::Infinite);
        config.notifications.global.title = Some("App".to_string());

        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        save_to_path(&config, &config_path).expect("failed to save config");
        let loaded = load_from_path(&config_path).expect("failed to load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn load_from_path_invalid_toml_errors() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "not = valid = toml").expect("failed to write invalid toml");

        let result = load_from_path(&config_path);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn load_with_override_warns_and_falls_back() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        fs::write(temp_dir.path().join(CONFIG_FILE), "[layout]\nmax_visible = 0\n")
            .expect("failed to write config");

        let (config, warning) = load_with_override(Some(temp_dir.path().to_path_buf()));
        assert_eq!(config, Config::default());
        assert!(warning.is_some_and(|w| w.contains("max_visible")));
    }

    #[test]
    fn load_with_override_missing_file_is_silent() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let (config, warning) = load_with_override(Some(temp_dir.path().to_path_buf()));
        assert_eq!(config, Config::default());
        assert!(warning.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [layout]
            position = "bottom-left"
            max_visible = 2

            [notifications.success]
            duration = 1500
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.layout.position, Position::BottomLeft);
        assert_eq!(config.layout.max_visible, Some(2));
        assert!(config.layout.enqueue);
        assert!(config.behavior.pause_on_hover);
        assert_eq!(
            config.notifications.success.duration,
            Some(Lifetime::from_millis(1500))
        );
        assert_eq!(
            config.notifications.promise.duration,
            Some(Lifetime::Infinite)
        );
        assert_eq!(config.animations.enter, DEFAULT_ENTER_ANIMATION);
    }

    #[test]
    fn save_to_path_creates_parent_directories() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("deep").join("path").join(CONFIG_FILE);

        save_to_path(&Config::default(), &config_path).expect("save should create directories");
        assert!(config_path.exists());
    }

    #[test]
    fn validate_rejects_zero_visible_cap() {
        let mut config = Config::default();
        config.layout.max_visible = Some(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        config.layout.max_visible = Some(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_durations_per_type() {
        let notifications = NotificationsConfig::default();
        for kind in NotificationType::ALL {
            let expected = if kind == NotificationType::Promise {
                Lifetime::Infinite
            } else {
                Lifetime::from_millis(DEFAULT_DURATION_MS)
            };
            assert_eq!(notifications.resolve(kind).duration, expected, "{kind}");
        }
    }

    #[test]
    fn global_overrides_type_entry() {
        let mut notifications = NotificationsConfig::default();
        notifications.error.title = Some("Error".to_string());
        notifications.global.duration = Some(Lifetime::from_millis(100));

        let resolved = notifications.resolve(NotificationType::Error);
        assert_eq!(resolved.title, "Error");
        assert_eq!(resolved.duration, Lifetime::from_millis(100));

        notifications.global.title = Some("Heads up".to_string());
        assert_eq!(
            notifications.resolve(NotificationType::Error).title,
            "Heads up"
        );
    }

    #[test]
    fn pause_triggers_follow_behavior_flags() {
        let mut config = Config::default();
        config.behavior.pause_on_hover = false;

        assert!(!config.allows_pause(PauseTrigger::Hover));
        assert!(config.allows_pause(PauseTrigger::Touch));
        assert!(config.allows_pause(PauseTrigger::Visibility));
        assert!(config.allows_pause(PauseTrigger::Manual));
    }
}
