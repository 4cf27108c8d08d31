//! File log for extraction runs, with optional echo to stderr through `tracing`.
//!
//! Environment:
//! - `DISABLE_LOG=true` no log file
//! - `ENABLE_PRINT_LOG=true` also print messages via `tracing`
//! - `LOG_LEVEL=silent|error|warn|info|debug`, default `info`

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use crate::get_create_dpd_dir;

const LOG_FILE_NAME: &str = "citations.log";
const KEEP_ROTATED_LOGS: usize = 5;

/// Verbosity, each level includes the ones below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Silent = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

impl Level {
    pub fn parse(s: &str) -> Option<Self> {
        let level = match s.trim().to_lowercase().as_str() {
            "silent" | "off" => Level::Silent,
            "error" => Level::Error,
            "warn" | "warning" => Level::Warn,
            "info" => Level::Info,
            "debug" => Level::Debug,
            _ => return None,
        };
        Some(level)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Silent => "SILENT",
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        }
    }
}

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `None` disables the log file.
    pub log_dir: Option<PathBuf>,
    pub print: bool,
    pub level: Level,
}

impl LogSettings {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let log_dir = if env_flag("DISABLE_LOG") {
            None
        } else {
            let dir = get_create_dpd_dir().map_err(|e| format!("Failed to get dpd dir: {}", e))?;
            Some(dir)
        };

        let level = std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|v| Level::parse(&v))
            .unwrap_or(Level::Info);

        Ok(LogSettings {
            log_dir,
            print: env_flag("ENABLE_PRINT_LOG"),
            level,
        })
    }
}

fn env_flag(name: &str) -> bool {
    matches!(std::env::var(name).map(|v| v.to_lowercase()).as_deref(), Ok("true") | Ok("1"))
}

/// Renames the previous run's log to `citations.<modified time>.log` and
/// removes all but the newest rotated logs.
fn rotate_log_file(log_file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !log_file.try_exists()? {
        return Ok(());
    }
    let dir = log_file.parent().ok_or("Log file has no parent directory")?;

    let modified: DateTime<Local> = std::fs::metadata(log_file)?.modified()?.into();
    let rotated = dir.join(format!("citations.{}.log", modified.format("%Y-%m-%dT%H-%M-%S")));
    std::fs::rename(log_file, rotated)?;

    let mut old_logs: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            let name = p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            name.starts_with("citations.") && name.ends_with(".log") && name != LOG_FILE_NAME
        })
        .collect();

    // Newest first, the timestamp sorts lexically.
    old_logs.sort_by(|a, b| b.cmp(a));
    for p in old_logs.iter().skip(KEEP_ROTATED_LOGS) {
        if let Err(e) = std::fs::remove_file(p) {
            eprintln!("Failed to remove old log file {:?}: {}", p, e);
        }
    }

    Ok(())
}

pub struct Logger {
    log_file: Option<PathBuf>,
    print: bool,
    level: Mutex<Level>,
}

impl Logger {
    pub fn new(settings: LogSettings) -> Self {
        let log_file = settings.log_dir.map(|dir| {
            let f = dir.join(LOG_FILE_NAME);
            if let Err(e) = rotate_log_file(&f) {
                eprintln!("Failed to rotate log file: {}", e);
            }
            f
        });

        Logger {
            log_file,
            print: settings.print,
            level: Mutex::new(settings.level),
        }
    }

    fn silent() -> Self {
        Logger::new(LogSettings { log_dir: None, print: false, level: Level::Silent })
    }

    /// Installs a stderr `tracing` subscriber, filtered by `RUST_LOG`.
    pub fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| format!("Failed to set tracing subscriber: {}", e))?;
        Ok(())
    }

    pub fn log(&self, level: Level, msg: &str) {
        if level == Level::Silent || level > self.get_level() {
            return;
        }

        if self.print {
            match level {
                Level::Error => tracing::error!("{}", msg),
                Level::Warn => tracing::warn!("{}", msg),
                Level::Info => tracing::info!("{}", msg),
                Level::Debug => tracing::debug!("{}", msg),
                Level::Silent => {}
            }
        }

        if let Some(path) = &self.log_file
            && let Err(e) = append_line(path, level, msg) {
                eprintln!("Failed to write to log file {:?}: {}", path, e);
            }
    }

    pub fn get_level(&self) -> Level {
        *self.level.lock()
    }

    pub fn set_level(&self, level: Level) {
        *self.level.lock() = level;
    }
}

fn append_line(path: &Path, level: Level, msg: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let now = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    writeln!(file, "[{}] {:<5} {}", now, level.as_str(), msg)
}

static LOGGER: OnceLock<Logger> = OnceLock::new();
static TRACING: OnceLock<()> = OnceLock::new();

fn logger() -> &'static Logger {
    let logger = LOGGER.get_or_init(|| match LogSettings::from_env() {
        Ok(settings) => Logger::new(settings),
        Err(e) => {
            eprintln!("Failed to create logger: {}", e);
            Logger::silent()
        }
    });

    if logger.print {
        TRACING.get_or_init(|| {
            // A test harness may have installed its own subscriber.
            let _ = Logger::init_tracing();
        });
    }

    logger
}

pub fn info(msg: &str) {
    logger().log(Level::Info, msg);
}

pub fn warn(msg: &str) {
    logger().log(Level::Warn, msg);
}

pub fn error(msg: &str) {
    logger().log(Level::Error, msg);
}

pub fn debug(msg: &str) {
    logger().log(Level::Debug, msg);
}

pub fn get_log_level() -> Level {
    logger().get_level()
}

pub fn set_log_level(level: Level) {
    logger().set_level(level);
}

/// Returns false for an unknown level name.
pub fn set_log_level_str(level: &str) -> bool {
    Level::parse(level).map(set_log_level).is_some()
}
