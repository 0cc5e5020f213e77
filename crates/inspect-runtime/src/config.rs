#![forbid(unsafe_code)]

//! Properties manager configuration.
//!
//! Built in code with [`ManagerConfig::default`] plus `with_*` overrides, or
//! from the environment with [`ManagerConfig::from_env`]:
//!
//! | Variable | Values | Field |
//! |----------|--------|-------|
//! | `INSPECT_PROPERTY_MODE` | `intersection`, `union` | [`mode`](ManagerConfig::mode) |
//! | `INSPECT_EARLY_EXIT` | `1`, `0`, `true`, `false` | [`early_exit`](ManagerConfig::early_exit) |
//! | `INSPECT_IDLE_POLL_MS` | integer milliseconds | [`idle_poll_interval`](ManagerConfig::idle_poll_interval) |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How panel applicability is reconciled across the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AggregationMode {
    /// Show only what every selected object accepts.
    #[default]
    Intersection,
    /// Show everything any selected object accepts, each panel bound to the
    /// objects that accepted it.
    Union,
}

impl AggregationMode {
    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intersection => "intersection",
            Self::Union => "union",
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("intersection") {
            Ok(Self::Intersection)
        } else if s.eq_ignore_ascii_case("union") {
            Ok(Self::Union)
        } else {
            Err(())
        }
    }
}

/// How reflected properties and symbols are reconciled across the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PropertyMerge {
    /// Keep a group only if every object contributed it, whatever the mode.
    #[default]
    Intersect,
    /// Intersect in intersection mode; in union mode keep every group any
    /// object contributed, with the instances of the objects that did.
    FollowMode,
}

/// Errors produced while reading configuration from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable held a value that could not be parsed.
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { var, value } => {
                write!(f, "invalid value for {var}: {value:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for a [`PropertiesManager`](crate::PropertiesManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Mode used until the first `set_mode` call.
    pub mode: AggregationMode,

    /// Stop selection processing once nothing common can remain.
    ///
    /// Never changes the result; disabling it is only useful for comparison.
    pub early_exit: bool,

    /// Reconciliation rule for property groups.
    pub property_merge: PropertyMerge,

    /// Sleep between polls in [`wait_until_idle`](crate::PropertiesManager::wait_until_idle).
    pub idle_poll_interval: Duration,

    /// Name given to worker threads.
    pub thread_name: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            mode: AggregationMode::Intersection,
            early_exit: true,
            property_merge: PropertyMerge::Intersect,
            idle_poll_interval: Duration::from_millis(5),
            thread_name: "inspect-properties".into(),
        }
    }
}

impl ManagerConfig {
    /// Set the initial aggregation mode.
    #[must_use]
    pub fn with_mode(mut self, mode: AggregationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable the selection-processing early exit.
    #[must_use]
    pub fn with_early_exit(mut self, enabled: bool) -> Self {
        self.early_exit = enabled;
        self
    }

    /// Set the property reconciliation rule.
    #[must_use]
    pub fn with_property_merge(mut self, merge: PropertyMerge) -> Self {
        self.property_merge = merge;
        self
    }

    /// Set the idle-wait poll interval.
    #[must_use]
    pub fn with_idle_poll_interval(mut self, interval: Duration) -> Self {
        self.idle_poll_interval = interval;
        self
    }

    /// Set the worker thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("INSPECT_PROPERTY_MODE") {
            config.mode = value
                .trim()
                .parse()
                .map_err(|()| invalid("INSPECT_PROPERTY_MODE", &value))?;
        }

        if let Some(value) = lookup("INSPECT_EARLY_EXIT") {
            config.early_exit = match value.trim() {
                "1" => true,
                "0" => false,
                v if v.eq_ignore_ascii_case("true") => true,
                v if v.eq_ignore_ascii_case("false") => false,
                _ => return Err(invalid("INSPECT_EARLY_EXIT", &value)),
            };
        }

        if let Some(value) = lookup("INSPECT_IDLE_POLL_MS") {
            let ms: u64 = value
                .trim()
                .parse()
                .map_err(|_| invalid("INSPECT_IDLE_POLL_MS", &value))?;
            config.idle_poll_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn invalid(var: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: value.to_owned(),
    }
}
