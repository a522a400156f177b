use anyhow::Result;
use log::error;
use std::process;

use marqueed::cli::{self, Args};
use marqueed::config::{ConfigManager, Settings};
use marqueed::logging::{self, LogConfig, LogDestination, LogFormat};
use marqueed::app;

fn main() {
    if let Err(e) = run() {
        error!("application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args();

    let config = ConfigManager::load(args.config_file.clone())?;

    logging::init_logger(build_log_config(&args, &config)?)?;

    let settings = Settings::resolve(&args, &config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(app::run(settings))
}

/// Console level comes from the verbosity flags, file logging from
/// --log-file (with its own level), with config-file fallbacks.
fn build_log_config(args: &Args, config: &ConfigManager) -> Result<LogConfig> {
    let console_level = if args.debug {
        log::LevelFilter::Trace
    } else if args.verbose {
        log::LevelFilter::Debug
    } else if args.quiet {
        log::LevelFilter::Error
    } else {
        config
            .get_log_level("logging", "level")?
            .unwrap_or(log::LevelFilter::Info)
    };

    let format: LogFormat = args
        .log_format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let log_file = args
        .log_file
        .clone()
        .or_else(|| config.get_path("logging", "file"));

    let (file_level, destination) = match log_file {
        Some(path) => {
            let level = match &args.log_file_level {
                Some(level) => logging::parse_log_level(level)?,
                None => config
                    .get_log_level("logging", "file-level")?
                    .unwrap_or(console_level),
            };
            (Some(level), LogDestination::Both(path))
        }
        None => (None, LogDestination::Console),
    };

    Ok(LogConfig {
        console_level,
        file_level,
        format,
        destination,
    })
}
