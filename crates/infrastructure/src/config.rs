use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use config::builder::DefaultState;
use domain::{Preset, RetryPolicy};
use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_FOLDER_PERMISSIONS: u32 = 0o755;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrinterConfig {
    /// Program invoked to render and print labels
    pub binary: String,
    /// Number of liveness probes after powering on
    pub retry_attempts: u32,
    /// Base delay in seconds between probes
    pub retry_base_delay_seconds: u64,
    pub auto_shutdown_delay_minutes: u64,
    /// Where preview images are rendered; a leading `~/` is expanded
    pub drafts_folder: String,
    /// Octal permission bits for created directories, e.g. "755"
    pub folder_permissions: String,
    pub font_size: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GpioConfig {
    /// GPIO line switching the printer relay; no relay when absent
    #[serde(default)]
    pub relay_pin: Option<u32>,
    pub sysfs_root: String,
    pub active_low: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// DEBUG, INFO, WARN or ERROR
    pub level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentConfig {
    pub printer: PrinterConfig,
    pub gpio: GpioConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub presets: BTreeMap<String, Preset>,
}

impl AgentConfig {
    /// Load `<config_dir>/config.{yaml,toml,json}` over built-in defaults,
    /// then environment overrides (e.g. `LABEL__PRINTER__FONT_SIZE=24`)
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let s = Self::defaults()?
            .add_source(File::with_name(&format!("{}/config", config_dir)).required(false))
            .add_source(Environment::with_prefix("LABEL").separator("__"))
            .build()?;

        Self::finish(s.try_deserialize()?)
    }

    /// Parse a YAML document over the built-in defaults
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let s = Self::defaults()?
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?;

        Self::finish(s.try_deserialize()?)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("printer.binary", "ptouch-print")?
            .set_default("printer.retry_attempts", 5)?
            .set_default("printer.retry_base_delay_seconds", 5)?
            .set_default("printer.auto_shutdown_delay_minutes", 2)?
            .set_default("printer.drafts_folder", "~/.cache/label-agent/drafts")?
            .set_default("printer.folder_permissions", "755")?
            .set_default("printer.font_size", 32)?
            .set_default("gpio.sysfs_root", "/sys/class/gpio")?
            .set_default("gpio.active_low", true)?
            .set_default("logging.level", "INFO")
    }

    fn finish(mut cfg: Self) -> Result<Self, ConfigError> {
        cfg.printer.drafts_folder = expand_path(&cfg.printer.drafts_folder)
            .to_string_lossy()
            .into_owned();
        Ok(cfg)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_secs(
            self.printer.retry_attempts,
            self.printer.retry_base_delay_seconds,
        )
    }

    pub fn auto_shutdown_delay(&self) -> Duration {
        Duration::from_secs(self.printer.auto_shutdown_delay_minutes.saturating_mul(60))
    }

    pub fn drafts_folder(&self) -> PathBuf {
        PathBuf::from(&self.printer.drafts_folder)
    }

    pub fn folder_permissions(&self) -> u32 {
        let raw = self.printer.folder_permissions.trim();
        let digits = raw.strip_prefix("0o").unwrap_or(raw);
        match u32::from_str_radix(digits, 8) {
            Ok(mode) if mode <= 0o7777 => mode,
            _ => {
                warn!(value = %raw, "Invalid folder permissions, using 755");
                DEFAULT_FOLDER_PERMISSIONS
            }
        }
    }

    /// Look up a preset; names are case-insensitive
    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets.get(&name.to_lowercase())
    }

    /// Preset names in sorted order
    pub fn preset_names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }
}

impl LoggingConfig {
    /// `tracing` filter directive for the configured level; unknown levels map to info
    pub fn filter_directive(&self) -> &'static str {
        match self.level.trim().to_uppercase().as_str() {
            "DEBUG" => "debug",
            "INFO" => "info",
            "WARN" | "WARNING" => "warn",
            "ERROR" => "error",
            _ => "info",
        }
    }
}

/// Expand a leading `~/` to the user's home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
