//! Diagnostic logging for the binary.
//!
//! The shell owns stdout, so events go to a file when one is configured and
//! are discarded otherwise.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Filter directives, e.g. `CREWDESK_LOG=crewdesk=debug`.
pub const LOG_ENV: &str = "CREWDESK_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

pub fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber. Calling it again is harmless.
pub fn init_logging(log_file: Option<&Path>) -> io::Result<()> {
    let filter = filter_from(std::env::var(LOG_ENV).ok().as_deref());
    match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
    Ok(())
}
