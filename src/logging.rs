// Logging backend for marqueed
//
// A boxed log::Log implementation behind the `log` facade: text or JSON
// line format, console and/or file destinations, with independent levels
// for each. Timestamps are local time, YYYY-MM-DD HH:mm:ss.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use log::{Level, LevelFilter};
use serde::Serialize;

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("invalid log format: {}. Valid options: text, json", s)),
        }
    }
}

/// Where log lines go
#[derive(Debug, Clone, PartialEq)]
pub enum LogDestination {
    Console,
    File(PathBuf),
    Both(PathBuf),
}

/// One JSON log line
#[derive(Debug, Serialize)]
struct JsonLogEntry<'a> {
    timestamp: String,
    level: String,
    message: &'a str,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_level: LevelFilter,
    pub file_level: Option<LevelFilter>,
    pub format: LogFormat,
    pub destination: LogDestination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            file_level: None,
            format: LogFormat::Text,
            destination: LogDestination::Console,
        }
    }
}

struct DaemonLogger {
    config: LogConfig,
}

impl DaemonLogger {
    fn format_line(&self, level: Level, message: &str) -> String {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        match self.config.format {
            LogFormat::Text => {
                format!("{} [{}] {}", timestamp, level.to_string().to_uppercase(), message)
            }
            LogFormat::Json => {
                let entry = JsonLogEntry {
                    timestamp,
                    level: level.to_string().to_uppercase(),
                    message,
                };
                // fall back to text if serialization ever fails
                serde_json::to_string(&entry).unwrap_or_else(|_| {
                    format!("{} [{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), level, message)
                })
            }
        }
    }

    fn console_enabled(&self, level: Level) -> bool {
        level <= self.config.console_level
    }

    fn file_enabled(&self, level: Level) -> bool {
        self.config.file_level.map_or(false, |l| level <= l)
    }

    fn write_file(&self, path: &PathBuf, line: &str) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{}", line));
        if let Err(err) = result {
            eprintln!("log file error for {}: {}", path.display(), err);
        }
    }
}

impl log::Log for DaemonLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.console_enabled(metadata.level()) || self.file_enabled(metadata.level())
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = self.format_line(record.level(), &record.args().to_string());
        let level = record.level();

        match &self.config.destination {
            LogDestination::Console => {
                if self.console_enabled(level) {
                    let _ = writeln!(io::stderr(), "{}", line);
                }
            }
            LogDestination::File(path) => {
                if self.file_enabled(level) {
                    self.write_file(path, &line);
                }
            }
            LogDestination::Both(path) => {
                if self.console_enabled(level) {
                    let _ = writeln!(io::stderr(), "{}", line);
                }
                if self.file_enabled(level) {
                    self.write_file(path, &line);
                }
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Install the global logger. Call once, before any component logs.
pub fn init_logger(config: LogConfig) -> Result<()> {
    let max_level = config
        .file_level
        .map_or(config.console_level, |file| file.max(config.console_level));

    log::set_boxed_logger(Box::new(DaemonLogger { config }))
        .context("failed to set global logger")?;
    log::set_max_level(max_level);
    Ok(())
}

/// Convert a level name to a LevelFilter
pub fn parse_log_level(level_str: &str) -> Result<LevelFilter> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        "off" => Ok(LevelFilter::Off),
        _ => Err(anyhow::anyhow!(
            "invalid log level: {}. Valid levels: error, warn, info, debug, trace, off",
            level_str
        )),
    }
}
