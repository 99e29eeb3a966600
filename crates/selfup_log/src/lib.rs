use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

/// Environment variable that overrides the default log level.
pub const SELFUP_LOG_LEVEL: &str = "SELFUP_LOG_LEVEL";

const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_FILTER: LevelFilter = LevelFilter::INFO;

static LOG_LEVEL_GLOBAL: Mutex<Option<String>> = Mutex::new(None);

// A logging error
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("a global logger has already been installed")]
    AlreadyInitialized,
}

/// Arguments to the initialize_logging function
#[derive(Debug)]
pub struct LogArgs<T: AsRef<Path>> {
    /// The log level to use. When not set, the default log level is used.
    pub log_level: Option<String>,
    /// Whether or not we log to stdout.
    pub log_to_stdout: bool,
    /// The log file path which we write logs to. When not set, we do not write to a file.
    pub log_file_path: Option<T>,
    /// Whether we should delete the log file at each launch.
    pub delete_old_log_file: bool,
}

/// The log guard maintains tracing guards which send log information to other threads.
///
/// This must be kept alive for logging to function as expected. Dropping it flushes
/// whatever is still buffered, so it has to outlive the last log line before exit.
#[must_use]
#[derive(Debug)]
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
    _stdout_guard: Option<WorkerGuard>,
}

/// Initialize our application level logging using the given LogArgs.
///
/// # Returns
///
/// On success, this returns a guard which must be kept alive.
pub fn initialize_logging<T: AsRef<Path>>(args: LogArgs<T>) -> Result<LogGuard, Error> {
    if let Some(level) = args.log_level {
        *lock(&LOG_LEVEL_GLOBAL) = Some(level);
    }

    let (file_layer, _file_guard) = match args.log_file_path {
        Some(log_file_path) => {
            let file = open_log_file(log_file_path.as_ref(), args.delete_old_log_file)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let file_layer = fmt::layer()
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(non_blocking);
            (Some(file_layer), Some(guard))
        },
        None => (None, None),
    };

    let (stdout_layer, _stdout_guard) = if args.log_to_stdout {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
        let stdout_layer = fmt::layer().with_line_number(true).with_writer(non_blocking);
        (Some(stdout_layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(create_filter_layer())
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|_already_set| Error::AlreadyInitialized)?;

    Ok(LogGuard {
        _file_guard,
        _stdout_guard,
    })
}

fn open_log_file(log_path: &Path, delete_old_log_file: bool) -> Result<File, Error> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Old logs are dropped on request, otherwise only once the file has grown too large.
    if delete_old_log_file {
        std::fs::remove_file(log_path).ok();
    } else if log_path.exists() && std::fs::metadata(log_path)?.len() > MAX_FILE_SIZE {
        std::fs::remove_file(log_path)?;
    }

    let file = File::options().append(true).create(true).open(log_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = file.metadata() {
            let mut permissions = metadata.permissions();
            permissions.set_mode(0o600);
            file.set_permissions(permissions).ok();
        }
    }

    Ok(file)
}

/// Get the current log level by first seeing if it is set in application, then environment, then
/// otherwise using the default
pub fn get_log_level() -> String {
    lock(&LOG_LEVEL_GLOBAL)
        .clone()
        .unwrap_or_else(|| std::env::var(SELFUP_LOG_LEVEL).unwrap_or_else(|_| DEFAULT_FILTER.to_string()))
}

fn create_filter_layer() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(Directive::from(DEFAULT_FILTER))
        .parse_lossy(get_log_level())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use std::fs::read_to_string;

    use tracing::{
        debug,
        error,
        info,
        trace,
        warn,
    };

    use super::*;

    #[test]
    fn test_logging() {
        let tempdir = tempfile::TempDir::new().unwrap();
        let log_path = tempdir.path().join("logs").join("selfup.log");

        let guard = initialize_logging(LogArgs {
            log_level: Some("trace".to_owned()),
            log_to_stdout: false,
            log_file_path: Some(&log_path),
            delete_old_log_file: true,
        })
        .unwrap();

        assert_eq!(get_log_level(), "trace");

        trace!("abc");
        debug!("def");
        info!("ghi");
        warn!("jkl");
        error!("mno");

        // A second global logger is refused rather than silently ignored.
        assert!(matches!(
            initialize_logging(LogArgs {
                log_level: None,
                log_to_stdout: false,
                log_file_path: None::<&Path>,
                delete_old_log_file: false,
            }),
            Err(Error::AlreadyInitialized)
        ));

        // Dropping the guard flushes the non-blocking writer.
        drop(guard);
        let logs = read_to_string(&log_path).unwrap();
        for i in [
            "TRACE", "DEBUG", "INFO", "WARN", "ERROR", "abc", "def", "ghi", "jkl", "mno",
        ] {
            assert!(logs.contains(i), "missing {i} in {logs}");
        }
    }

    #[test]
    fn test_open_log_file_truncates_on_request() {
        let tempdir = tempfile::TempDir::new().unwrap();
        let log_path = tempdir.path().join("selfup.log");
        std::fs::write(&log_path, "old line\n").unwrap();

        drop(open_log_file(&log_path, false).unwrap());
        assert_eq!(read_to_string(&log_path).unwrap(), "old line\n");

        drop(open_log_file(&log_path, true).unwrap());
        assert_eq!(read_to_string(&log_path).unwrap(), "");
    }
}
