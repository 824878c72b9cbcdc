use crate::timeline::DEFAULT_PACKET_TRAVEL_MS;
use crate::utils::parse_duration_ms;
use anyhow::{Context, Result};
use log::warn;
use std::path::{Path, PathBuf};

/// When to emit ANSI colour codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(ColorMode::Auto),
            "always" | "on" => Some(ColorMode::Always),
            "never" | "off" => Some(ColorMode::Never),
            _ => None,
        }
    }

    pub fn enabled(&self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Settings read from `~/.flowsim/rc`
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub speed: f64,
    pub frame_ms: u64,
    pub packet_travel_ms: u64,
    pub color: ColorMode,
    pub keep_active: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speed: 1.0,
            frame_ms: 0,
            packet_travel_ms: DEFAULT_PACKET_TRAVEL_MS,
            color: ColorMode::Auto,
            keep_active: false,
        }
    }
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir)?;
        Some(home.join(".flowsim").join("rc"))
    }

    /// Load the rc file if there is one, otherwise defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse `key=value` lines; `#` starts a comment line
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                anyhow::bail!("line {}: expected key=value, got '{}'", number + 1, line);
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "speed" => {
                    let speed: f64 = value
                        .parse()
                        .ok()
                        .filter(|s: &f64| s.is_finite() && *s > 0.0)
                        .ok_or_else(|| anyhow::anyhow!("line {}: speed must be a positive number", number + 1))?;
                    config.speed = speed;
                }
                "frame" => {
                    config.frame_ms = parse_duration_ms(value)
                        .with_context(|| format!("line {}: bad frame interval", number + 1))?;
                }
                "packet.travel" => {
                    config.packet_travel_ms = parse_duration_ms(value)
                        .with_context(|| format!("line {}: bad packet travel time", number + 1))?;
                }
                "color" => {
                    config.color = ColorMode::from_str(value).ok_or_else(|| {
                        anyhow::anyhow!("line {}: color must be auto, always or never", number + 1)
                    })?;
                }
                "keep_active" => {
                    config.keep_active = parse_bool(value).ok_or_else(|| {
                        anyhow::anyhow!("line {}: keep_active must be true or false", number + 1)
                    })?;
                }
                other => warn!("ignoring unknown config key '{}'", other),
            }
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
