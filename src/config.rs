//! Configuration
//!
//! TOML configuration with a small discovery hierarchy and typed getters,
//! merged with CLI flags into the resolved [`Settings`] the daemon runs
//! on. Precedence is CLI flag, then config file value, then built-in
//! default.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info};
use toml::Value;

use crate::cli::Args;
use crate::{transport, web};

/// Configuration storage - section_name -> key -> value
pub type Configuration = HashMap<String, HashMap<String, String>>;

/// Default path for the mandatory local socket
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/marqueed.sock";

/// Default headless surface width in pixels
pub const DEFAULT_SURFACE_WIDTH: u32 = 1280;

/// Loads and answers questions about the config file
pub struct ConfigManager {
    config: Configuration,
}

impl ConfigManager {
    /// Build from an in-memory configuration (primarily for testing)
    pub fn from_config(config: Configuration) -> Self {
        Self { config }
    }

    /// Load configuration, preferring an explicit path, then the
    /// discovery hierarchy. A missing file is not an error.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self> {
        let candidates = match explicit {
            Some(path) => vec![path],
            None => discover_config_files(),
        };

        for path in candidates {
            debug!("checking for config at {}", path.display());
            if path.exists() {
                return Self::load_from_file(path);
            }
        }

        info!("no configuration file found, using defaults");
        Ok(Self {
            config: Configuration::new(),
        })
    }

    fn load_from_file(path: PathBuf) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config = parse_toml_config(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        info!("loaded configuration from {}", path.display());
        Ok(Self { config })
    }

    pub fn get_value(&self, section: &str, key: &str) -> Option<&String> {
        self.config.get(section).and_then(|s| s.get(key))
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        match self.get_value(section, key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(anyhow::anyhow!(
                    "invalid boolean for {}.{}: {}",
                    section,
                    key,
                    value
                )),
            },
            None => Ok(None),
        }
    }

    pub fn get_u16(&self, section: &str, key: &str) -> Result<Option<u16>> {
        match self.get_value(section, key) {
            Some(value) => {
                let parsed = value.parse::<u16>().with_context(|| {
                    format!("invalid port for {}.{}: {}", section, key, value)
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub fn get_u32(&self, section: &str, key: &str) -> Result<Option<u32>> {
        match self.get_value(section, key) {
            Some(value) => {
                let parsed = value.parse::<u32>().with_context(|| {
                    format!("invalid number for {}.{}: {}", section, key, value)
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_value(section, key).map(PathBuf::from)
    }

    pub fn get_log_level(&self, section: &str, key: &str) -> Result<Option<log::LevelFilter>> {
        match self.get_value(section, key) {
            Some(value) => Ok(Some(crate::logging::parse_log_level(value)?)),
            None => Ok(None),
        }
    }
}

/// Discovery hierarchy: `~/.marqueed.toml`, then
/// `~/.config/marqueed/config.toml`.
fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".marqueed.toml"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("marqueed").join("config.toml"));
    }
    paths
}

/// Flatten a TOML document into section/key/string maps. Top-level keys
/// land in the "base" section.
fn parse_toml_config(content: &str) -> Result<Configuration> {
    let value: Value = content.parse().context("invalid TOML")?;
    let mut config = Configuration::new();

    if let Value::Table(table) = value {
        for (section_or_key, entry) in table {
            match entry {
                Value::Table(section_table) => {
                    let section = config.entry(section_or_key).or_default();
                    for (key, v) in section_table {
                        section.insert(key, toml_value_to_string(&v));
                    }
                }
                other => {
                    config
                        .entry("base".to_string())
                        .or_default()
                        .insert(section_or_key, toml_value_to_string(&other));
                }
            }
        }
    }

    Ok(config)
}

fn toml_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub socket_path: PathBuf,
    pub tcp_enabled: bool,
    pub tcp_port: u16,
    pub web_enabled: bool,
    pub web_port: u16,
    pub static_dir: PathBuf,
    pub audio_player: String,
    pub surface_width: u32,
}

impl Settings {
    /// Merge CLI flags over config values over defaults.
    pub fn resolve(args: &Args, config: &ConfigManager) -> Result<Self> {
        let socket_path = args
            .socket_path
            .clone()
            .or_else(|| config.get_path("server", "socket-path"))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET_PATH));

        let tcp_enabled = args.tcp || config.get_bool("server", "tcp")?.unwrap_or(false);
        let tcp_port = match args.tcp_port {
            Some(port) => port,
            None => config
                .get_u16("server", "tcp-port")?
                .unwrap_or(transport::tcp::DEFAULT_PORT),
        };

        let web_enabled = args.web || config.get_bool("web", "enabled")?.unwrap_or(false);
        let web_port = match args.web_port {
            Some(port) => port,
            None => config.get_u16("web", "port")?.unwrap_or(web::DEFAULT_PORT),
        };

        let static_dir = args
            .static_dir
            .clone()
            .or_else(|| config.get_path("web", "static-dir"))
            .unwrap_or_else(|| PathBuf::from("static"));

        let audio_player = args
            .audio_player
            .clone()
            .or_else(|| config.get_value("audio", "player").cloned())
            .unwrap_or_else(|| "aplay".to_string());

        let surface_width = match args.surface_width {
            Some(width) => width,
            None => config
                .get_u32("display", "surface-width")?
                .unwrap_or(DEFAULT_SURFACE_WIDTH),
        };

        Ok(Self {
            socket_path,
            tcp_enabled,
            tcp_port,
            web_enabled,
            web_port,
            static_dir,
            audio_player,
            surface_width,
        })
    }
}
