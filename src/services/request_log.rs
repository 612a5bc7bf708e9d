use crate::domain::request_log::{LogEndpoint, LogEntry, LogLevel};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Append-only, per-endpoint request log.
///
/// Each write opens the endpoint file in append mode, writes the whole line
/// with a single `write_all`, and closes it again. Concurrent writers rely on
/// `O_APPEND` for line atomicity. A failed write never reaches the caller.
#[derive(Clone, Debug)]
pub struct RequestLog {
    dir: Arc<PathBuf>,
}

impl RequestLog {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: Arc::new(dir.into()) }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, endpoint: LogEndpoint) -> PathBuf {
        self.dir.join(endpoint.file_name())
    }

    pub async fn info(&self, endpoint: LogEndpoint, message: impl Into<String>) {
        self.log(endpoint, LogLevel::Info, message).await;
    }

    pub async fn error(&self, endpoint: LogEndpoint, message: impl Into<String>) {
        self.log(endpoint, LogLevel::Error, message).await;
    }

    pub async fn log(&self, endpoint: LogEndpoint, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry::now(endpoint, level, message);

        match level {
            LogLevel::Info => tracing::info!(endpoint = endpoint.file_stem(), "{}", entry.message),
            LogLevel::Error => tracing::error!(endpoint = endpoint.file_stem(), "{}", entry.message),
        }

        let dir = Arc::clone(&self.dir);
        let line = entry.to_line();
        let result = tokio::task::spawn_blocking(move || append_line(&dir, endpoint, &line)).await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(error = %e, endpoint = endpoint.file_stem(), "Failed to write request log");
            }
            Err(e) => {
                tracing::warn!(error = %e, endpoint = endpoint.file_stem(), "Request log writer task failed");
            }
        }
    }

    /// Confirms the log directory exists (creating it if needed) and accepts writes.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the directory cannot be created or written.
    pub async fn check_writable(&self) -> io::Result<()> {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(dir.as_path())?;
            let probe = dir.join(".readyz");
            std::fs::write(&probe, b"ok")?;
            std::fs::remove_file(&probe)
        })
        .await
        .map_err(io::Error::other)?
    }
}

fn append_line(dir: &Path, endpoint: LogEndpoint, line: &str) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut file = OpenOptions::new().create(true).append(true).open(dir.join(endpoint.file_name()))?;
    file.write_all(line.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("formrelay-log-test-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_log_creates_directory_and_appends() {
        let dir = temp_dir();
        let log = RequestLog::new(dir.join("nested"));

        log.info(LogEndpoint::Contact, "first").await;
        log.error(LogEndpoint::Contact, "second").await;

        let content = std::fs::read_to_string(log.path_for(LogEndpoint::Contact)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] first"));
        assert!(lines[1].ends_with("[ERROR] second"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_endpoints_write_separate_files() {
        let dir = temp_dir();
        let log = RequestLog::new(&dir);

        log.info(LogEndpoint::Email, "to email").await;
        log.info(LogEndpoint::EmailFallback, "to fallback").await;

        let email = std::fs::read_to_string(dir.join("email.log")).unwrap();
        let fallback = std::fs::read_to_string(dir.join("email_fallback.log")).unwrap();
        assert!(email.contains("to email") && !email.contains("to fallback"));
        assert!(fallback.contains("to fallback"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_produce_whole_lines() {
        let dir = temp_dir();
        let log = RequestLog::new(&dir);
        let writers = 64;

        let tasks: Vec<_> = (0..writers)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move {
                    log.info(LogEndpoint::AirClaim, format!("entry-{i:03} {}", "x".repeat(256))).await;
                })
            })
            .collect();
        futures::future::join_all(tasks).await;

        let content = std::fs::read_to_string(log.path_for(LogEndpoint::AirClaim)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), writers);
        for line in &lines {
            assert!(line.starts_with('['), "malformed line: {line}");
            assert!(line.contains("] [INFO] entry-"), "malformed line: {line}");
            assert!(line.ends_with(&"x".repeat(256)), "truncated line: {line}");
        }

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_unwritable_destination_is_swallowed() {
        let dir = temp_dir();
        std::fs::write(&dir, b"not a directory").unwrap();
        let log = RequestLog::new(&dir);

        // Must return normally even though the directory cannot be created.
        log.info(LogEndpoint::Server, "lost").await;
        assert!(log.check_writable().await.is_err());

        std::fs::remove_file(dir).ok();
    }
}
