use std::error::Error;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, Level};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// In-memory debug trail shared by every task of a run.
///
/// Appends are serialized by the inner mutex, so concurrent tasks may log
/// freely. `main` dumps the trail to stderr when a run fails.
#[derive(Debug, Clone, Default)]
pub struct DebugLog {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl DebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        // A writer that panicked mid-append leaves a partial line, nothing worse.
        self.buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct DebugLogWriter {
    log: DebugLog,
}

impl io::Write for DebugLogWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.log.lock().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for DebugLog {
    type Writer = DebugLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DebugLogWriter { log: self.clone() }
    }
}

/// Install the global subscriber: timestamped events on stderr filtered by
/// RUST_LOG (default `info`), plus debug-level events captured in `debug_log`.
pub fn init(debug_log: &DebugLog) {
    let stderr = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let trail = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(debug_log.clone())
        .with_filter(filter_fn(|meta| *meta.level() == Level::DEBUG));

    tracing_subscriber::registry().with(stderr).with(trail).init();
}

/// Log `err` as a timestamped error event and return the debug trail, ready
/// for stderr. The trail is empty when nothing was captured.
pub fn fatal(err: &dyn Error, debug_log: &DebugLog) -> String {
    error!("{err}");
    if debug_log.is_empty() {
        String::new()
    } else {
        format!("--- debug log ---\n{}", debug_log.contents())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, CONFIG_FILE};
    use std::io::Write;
    use tracing::{debug, info};

    fn capture(log: &DebugLog) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(log.clone())
                .with_filter(filter_fn(|meta| *meta.level() == Level::DEBUG)),
        )
    }

    #[test]
    fn test_writer_appends() {
        let log = DebugLog::new();
        assert!(log.is_empty());
        log.make_writer().write_all(b"first\n").unwrap();
        log.make_writer().write_all(b"second\n").unwrap();
        assert_eq!(log.contents(), "first\nsecond\n");
    }

    #[test]
    fn test_captures_debug_events_only() {
        let log = DebugLog::new();
        tracing::subscriber::with_default(capture(&log), || {
            debug!("client.Issues.ListByRepo page=0");
            info!("no more pages");
        });
        let contents = log.contents();
        assert!(contents.contains("client.Issues.ListByRepo page=0"));
        assert!(!contents.contains("no more pages"));
    }

    #[test]
    fn test_concurrent_writers_keep_whole_lines() {
        let log = DebugLog::new();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let line = format!("thread {t} line {i}\n");
                        log.make_writer().write_all(line.as_bytes()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = log.contents();
        assert_eq!(contents.lines().count(), 400);
        assert!(contents.lines().all(|l| l.starts_with("thread ")));
    }

    #[test]
    fn test_fatal_config_error_is_timestamped_display() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[store\nroot = ").unwrap();
        let err = Config::load_from(&path).unwrap_err();

        let stderr = DebugLog::new();
        let trail = DebugLog::new();
        trail
            .make_writer()
            .write_all(b"client.Issues.ListByRepo page=0\n")
            .unwrap();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(stderr.clone()),
        );

        let rest = tracing::subscriber::with_default(subscriber, || fatal(&err, &trail));

        let line = stderr.contents();
        assert!(line.chars().next().is_some_and(|c| c.is_ascii_digit()));
        assert!(line.contains("ERROR"));
        assert!(line.contains("Failed to parse config file"));
        assert!(!line.contains("TomlError {"));
        assert!(rest.starts_with("--- debug log ---\n"));
        assert!(rest.contains("client.Issues.ListByRepo page=0"));
    }

    #[test]
    fn test_fatal_without_trail() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let rest = tracing::subscriber::with_default(
            tracing_subscriber::registry(),
            || fatal(&err, &DebugLog::new()),
        );
        assert!(rest.is_empty());
    }
}
