use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Default number of ticks between a host close notification and the
/// ownership recheck.
pub const DEFAULT_CLOSE_RECHECK_DELAY_TICKS: u64 = 1;

/// Default animation tick interval used when no button declares a speed.
pub const DEFAULT_ANIMATION_INTERVAL: u64 = 20;

/// Framework settings loaded from `gridmenu.toml`.
///
/// Every section is optional; missing sections and keys fall back to the
/// defaults, which reproduce the legacy dispatch behaviour exactly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Timing knobs for work the registry defers through the host scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Ticks to wait before reconciling a host-originated close.
    #[serde(default = "default_close_recheck_delay")]
    pub close_recheck_delay_ticks: u64,
    /// Fallback interval for `start_default_animation`.
    #[serde(default = "default_animation_interval")]
    pub default_animation_interval: u64,
}

/// Policies applied while rendering sessions and dispatching clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Invoke the template update handler before placing each updatable
    /// button, in addition to the single call at the end of a render.
    #[serde(default = "default_true")]
    pub per_button_update: bool,
    /// Cancel clicks that land on cells without a bound button.
    #[serde(default)]
    pub suppress_unbound_clicks: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            close_recheck_delay_ticks: DEFAULT_CLOSE_RECHECK_DELAY_TICKS,
            default_animation_interval: DEFAULT_ANIMATION_INTERVAL,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            per_button_update: true,
            suppress_unbound_clicks: false,
        }
    }
}

fn default_close_recheck_delay() -> u64 {
    DEFAULT_CLOSE_RECHECK_DELAY_TICKS
}

fn default_animation_interval() -> u64 {
    DEFAULT_ANIMATION_INTERVAL
}

fn default_true() -> bool {
    true
}

impl MenuConfig {
    /// Parse and validate config TOML.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input).context("failed to parse gridmenu config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read gridmenu config at {}", path.display()))?;

        Self::from_toml_str(&raw)
            .with_context(|| format!("invalid gridmenu config at {}", path.display()))
    }

    /// Load the file named by `var` if the variable is set, defaults otherwise.
    pub fn from_env(var: &str) -> Result<Self> {
        match std::env::var_os(var) {
            Some(path) if !path.is_empty() => Self::from_path(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    /// Validate semantic constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        validate_positive(
            "scheduler.close_recheck_delay_ticks",
            self.scheduler.close_recheck_delay_ticks,
        )?;
        validate_positive(
            "scheduler.default_animation_interval",
            self.scheduler.default_animation_interval,
        )?;
        Ok(())
    }
}

fn validate_positive(field: &str, value: u64) -> Result<()> {
    if value == 0 {
        bail!("{field} must be at least 1");
    }
    Ok(())
}
