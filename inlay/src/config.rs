//! User configuration for inlay.
//!
//! Read once at startup from `$XDG_CONFIG_HOME/inlay/config.toml` (falling back
//! to `~/.config/inlay/config.toml`). A missing file means defaults; a file
//! that cannot be read or parsed is a soft failure: the error is logged and
//! defaults are used, so a broken config never prevents editing.
//!
//! ```toml
//! theme = "catppuccin-mocha"
//!
//! [inline_chat]
//! enabled = true
//! auto_visible = true
//! debounce_ms = 100
//! max_diff_height = 12
//!
//! [[inline_chat.actions]]
//! id = "explain"
//! label = "Rewrite with llm"
//! command = "llm -s 'Rewrite this code, reply with one fenced block'"
//!
//! [[inline_chat.actions]]
//! id = "comment"
//! label = "Toggle comment"
//! builtin = "toggle-comment"
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use inlay_core::{Capabilities, InlineChatOptions, PreferenceSource};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("inline chat action `{id}`: {reason}")]
    InvalidAction { id: String, reason: &'static str },
}

/// Top-level `config.toml` contents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub theme: String,
    pub inline_chat: InlineChatConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self { theme: "catppuccin-mocha".to_owned(), inline_chat: InlineChatConfig::default() }
    }
}

/// `[inline_chat]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InlineChatConfig {
    /// Capability switch; `false` means the affordance never opens.
    pub enabled: bool,
    /// Initial value of the auto-show preference (toggled at runtime with Ctrl-T).
    pub auto_visible: bool,
    pub debounce_ms: u64,
    /// Rows the diff overlay may grow to before it stops growing.
    pub max_diff_height: u16,
    /// Rows added when nudging the chat widget below an overflowing diff.
    pub overflow_padding: u32,
    /// Actions listed in the chat widget, in order. Empty means the built-in set.
    pub actions: Vec<ActionConfig>,
}

impl Default for InlineChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_visible: true,
            debounce_ms: 100,
            max_diff_height: 12,
            // One terminal row is one line, so a single row of padding reads
            // the same as the pixel padding of a graphical editor.
            overflow_padding: 1,
            actions: Vec::new(),
        }
    }
}

impl InlineChatConfig {
    pub fn options(&self) -> InlineChatOptions {
        InlineChatOptions {
            debounce: Duration::from_millis(self.debounce_ms),
            overflow_padding: self.overflow_padding,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities { supports_inline_chat: self.enabled }
    }
}

/// One `[[inline_chat.actions]]` entry. Exactly one of `command` and `builtin`
/// must be set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionConfig {
    pub id: String,
    pub label: String,
    /// Shell command run with the selected lines on stdin; its stdout is the reply.
    #[serde(default)]
    pub command: Option<String>,
    /// Name of a built-in action.
    #[serde(default)]
    pub builtin: Option<String>,
}

impl ActionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason| ConfigError::InvalidAction { id: self.id.clone(), reason };
        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        match (&self.command, &self.builtin) {
            (Some(_), Some(_)) => Err(invalid("set either `command` or `builtin`, not both")),
            (None, None) => Err(invalid("one of `command` or `builtin` is required")),
            (Some(command), None) if command.trim().is_empty() => {
                Err(invalid("`command` must not be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Returns the path to the inlay config file.
///
/// Prefers `$XDG_CONFIG_HOME/inlay/config.toml`; falls back to
/// `~/.config/inlay/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("inlay").join("config.toml")
}

/// Parses config text. `path` is only used in error messages.
pub fn parse(raw: &str, path: &Path) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(raw)
        .map_err(|source| ConfigError::Parse { path: path.to_owned(), source })?;
    for action in &config.inline_chat.actions {
        action.validate()?;
    }
    Ok(config)
}

/// Loads the config at `path`. A missing file yields the defaults.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => parse(&raw, path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(source) => Err(ConfigError::Read { path: path.to_owned(), source }),
    }
}

/// Loads the user config, falling back to defaults on any error.
pub fn load() -> Config {
    let path = config_path();
    match load_from(&path) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "config loaded");
            config
        }
        Err(error) => {
            tracing::warn!(%error, "config ignored, using defaults");
            Config::default()
        }
    }
}

/// Runtime-toggleable preference source shared with the inline chat engine.
#[derive(Debug)]
pub struct LivePreferences {
    auto_show: AtomicBool,
}

impl LivePreferences {
    pub fn new(auto_show: bool) -> Self {
        Self { auto_show: AtomicBool::new(auto_show) }
    }

    pub fn auto_show(&self) -> bool {
        self.auto_show.load(Ordering::Relaxed)
    }

    /// Flips the auto-show preference and returns the new value.
    pub fn toggle_auto_show(&self) -> bool {
        !self.auto_show.fetch_xor(true, Ordering::Relaxed)
    }
}

impl PreferenceSource for LivePreferences {
    fn auto_show_inline_chat(&self) -> bool {
        self.auto_show()
    }
}
