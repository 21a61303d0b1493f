use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::Utc;

use crate::security::InvocationTrust;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Append-only record of what the gateway ran and what it refused
#[derive(Debug, Clone)]
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    /// Create an AuditLogger writing to the given path
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        // Ensure directory exists
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self { log_path })
    }

    /// Log an invocation that reached the process invoker
    ///
    /// `outcome` is `ok` or the failure category.
    pub fn log_invocation(
        &self,
        trust: InvocationTrust,
        repo_path: &Path,
        argv: &[String],
        outcome: &str,
    ) -> std::io::Result<()> {
        let log_entry = format!(
            "[{}] [{}] [{}] [{}] [outcome:{}] git {}\n",
            Utc::now().to_rfc3339(),
            current_user(),
            trust.as_str(),
            repo_path.display().to_string().escape_debug(),
            outcome,
            argv.join(" ").escape_debug()
        );

        self.append(&log_entry)
    }

    /// Log a request refused before anything ran
    ///
    /// Records validation failures and unresolvable repositories so probing
    /// attempts leave a trail.
    pub fn log_rejection(
        &self,
        trust: InvocationTrust,
        repository: &str,
        command: &str,
        reason: &str,
    ) -> std::io::Result<()> {
        let log_entry = format!(
            "[{}] [{}] [{}] [REJECTED] repository=\"{}\" command=\"{}\" reason=\"{}\"\n",
            Utc::now().to_rfc3339(),
            current_user(),
            trust.as_str(),
            repository.escape_debug(),
            command.escape_debug(),
            reason
        );

        self.append(&log_entry)
    }

    fn append(&self, entry: &str) -> std::io::Result<()> {
        self.rotate_if_needed()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        file.write_all(entry.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    /// Rotate log file if it exceeds MAX_LOG_SIZE
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(&self.log_path)?;
        if metadata.len() > MAX_LOG_SIZE {
            // Rotate: audit.log -> audit.log.1
            let backup_path = self.log_path.with_extension("log.1");
            fs::rename(&self.log_path, backup_path)?;
        }

        Ok(())
    }

    /// Get the path to the log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

fn current_user() -> String {
    std::env::var("USER").unwrap_or_else(|_| "unknown".to_string())
}
