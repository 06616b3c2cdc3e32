//! Rolling file logs for engine diagnostics.
//!
//! Engine modules only talk to the `log` facade. This module installs the
//! `flexi_logger` file backend when a host (or the CLI `--log-dir` flag)
//! asks for it.
//!
//! # Invariants
//! - One backend per process. Repeating `init_logging` with equal settings is
//!   a no-op; different settings are rejected with `LoggingError::Conflict`.
//! - A panic is recorded as one `event=panic` line before the previous hook
//!   runs.

use flexi_logger::{
    Cleanup, Criterion, FileSpec, LogSpecification, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{self, PanicHookInfo};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const LOG_BASENAME: &str = "primary_category";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED: usize = 5;
const PANIC_SUMMARY_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

/// Validated log target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LevelFilter,
    /// Absolute directory holding `primary_category*.log` files.
    pub dir: PathBuf,
}

impl LogSettings {
    /// Parses a level name and a log directory.
    ///
    /// A missing or blank level picks `default_level()`. Level names are
    /// case-insensitive (`warn`, `INFO`, ...).
    pub fn parse(dir: &Path, level: Option<&str>) -> Result<Self, LoggingError> {
        let level = match level.map(str::trim) {
            None | Some("") => default_level(),
            Some(name) => LevelFilter::from_str(name)
                .map_err(|_| LoggingError::InvalidLevel(name.to_string()))?,
        };
        if !dir.is_absolute() {
            return Err(LoggingError::RelativeDir(dir.to_path_buf()));
        }
        Ok(Self {
            level,
            dir: dir.to_path_buf(),
        })
    }
}

/// `Debug` in debug builds, `Info` otherwise.
pub fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

#[derive(Debug)]
pub enum LoggingError {
    InvalidLevel(String),
    RelativeDir(PathBuf),
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    /// The file backend refused to start.
    Backend(String),
    Conflict {
        active: LogSettings,
        requested: LogSettings,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLevel(name) => write!(
                f,
                "unknown log level `{name}`; expected off|error|warn|info|debug|trace"
            ),
            Self::RelativeDir(dir) => {
                write!(f, "log directory must be absolute: `{}`", dir.display())
            }
            Self::CreateDir { dir, source } => {
                write!(f, "cannot create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(message) => write!(f, "log backend failed to start: {message}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already active at {} in `{}`; cannot switch to {} in `{}`",
                active.level,
                active.dir.display(),
                requested.level,
                requested.dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Starts the file backend, or confirms the running one matches `settings`.
pub fn init_logging(settings: &LogSettings) -> Result<(), LoggingError> {
    let active = ACTIVE.get_or_try_init(|| start_backend(settings))?;
    if active.settings != *settings {
        return Err(LoggingError::Conflict {
            active: active.settings.clone(),
            requested: settings.clone(),
        });
    }
    Ok(())
}

fn start_backend(settings: &LogSettings) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&settings.dir).map_err(|source| LoggingError::CreateDir {
        dir: settings.dir.clone(),
        source,
    })?;

    let handle = Logger::with(LogSpecification::builder().default(settings.level).build())
        .log_to_file(
            FileSpec::default()
                .directory(settings.dir.as_path())
                .basename(LOG_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_ROTATED),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    record_panics();
    info!(
        "event=logging_start module=logging status=ok version={} level={} dir={}",
        env!("CARGO_PKG_VERSION"),
        settings.level,
        settings.dir.display()
    );

    Ok(ActiveLogger {
        settings: settings.clone(),
        _handle: handle,
    })
}

fn record_panics() {
    static INSTALLED: OnceCell<()> = OnceCell::new();
    INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            error!(
                "event=panic module=logging status=error location={} message={}",
                panic_location(info),
                panic_message(info)
            );
            previous(info);
        }));
    });
}

fn panic_location(info: &PanicHookInfo<'_>) -> String {
    info.location()
        .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()))
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let raw = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload");
    one_line(raw, PANIC_SUMMARY_CHARS)
}

/// Flattens `text` onto one line of at most `limit` chars, marking cuts
/// with `...`. Panic payloads may carry request paths.
fn one_line(text: &str, limit: usize) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    match flat.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

#[cfg(test)]
mod tests {
    use super::{default_level, init_logging, one_line, LogSettings, LoggingError};
    use log::LevelFilter;
    use std::path::Path;

    #[test]
    fn parse_reads_levels_case_insensitively() {
        let dir = std::env::temp_dir();

        let warn = LogSettings::parse(&dir, Some(" WARN ")).unwrap();
        assert_eq!(warn.level, LevelFilter::Warn);

        let defaulted = LogSettings::parse(&dir, None).unwrap();
        assert_eq!(defaulted.level, default_level());
        assert_eq!(LogSettings::parse(&dir, Some("")).unwrap(), defaulted);
    }

    #[test]
    fn parse_rejects_unknown_level_and_relative_dir() {
        let level = LogSettings::parse(&std::env::temp_dir(), Some("verbose")).unwrap_err();
        assert!(matches!(level, LoggingError::InvalidLevel(name) if name == "verbose"));

        let dir = LogSettings::parse(Path::new("logs/dev"), Some("info")).unwrap_err();
        assert!(dir.to_string().contains("absolute"));
    }

    #[test]
    fn one_line_flattens_and_cuts_request_paths() {
        assert_eq!(one_line("/event/\nmusic\r/", 40), "/event/ music /");
        assert_eq!(one_line("/event/event_category/music/", 6), "/event...");
        assert_eq!(one_line("short", 5), "short");
    }

    #[test]
    fn init_is_idempotent_and_rejects_other_settings() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let settings = LogSettings::parse(first.path(), Some("info")).unwrap();

        init_logging(&settings).unwrap();
        init_logging(&settings).unwrap();

        let louder = LogSettings {
            level: LevelFilter::Debug,
            ..settings.clone()
        };
        assert!(matches!(
            init_logging(&louder).unwrap_err(),
            LoggingError::Conflict { .. }
        ));

        let moved = LogSettings::parse(second.path(), Some("info")).unwrap();
        let err = init_logging(&moved).unwrap_err();
        assert!(err.to_string().contains("cannot switch"));
    }
}
