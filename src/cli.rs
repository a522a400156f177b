//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

/// Notification Display Server
#[derive(Parser, Debug)]
#[command(name = "marqueed")]
#[command(about = "Accepts notification requests over local, network and web transports and displays each as a scrolling marquee")]
#[command(version)]
pub struct Args {
    /// Path for the local message socket
    #[arg(short = 's', long = "socket", value_name = "PATH")]
    pub socket_path: Option<PathBuf>,

    /// Enable the TCP socket for network messages
    #[arg(short = 't', long = "tcp")]
    pub tcp: bool,

    /// TCP port for network messages
    #[arg(long = "tcp-port", value_name = "PORT")]
    pub tcp_port: Option<u16>,

    /// Enable the web UI and HTTP submission endpoint
    #[arg(short = 'w', long = "webui")]
    pub web: bool,

    /// Web UI port
    #[arg(long = "webui-port", value_name = "PORT")]
    pub web_port: Option<u16>,

    /// Directory of web UI static assets
    #[arg(long = "static-dir", value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    /// External audio player command
    #[arg(long = "audio-player", value_name = "CMD")]
    pub audio_player: Option<String>,

    /// Display surface width in pixels for the headless presenter
    #[arg(long = "surface-width", value_name = "PX")]
    pub surface_width: Option<u32>,

    /// Verbose output (debug level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,
}

/// Parse process arguments
pub fn parse_args() -> Args {
    Args::parse()
}
