use async_trait::async_trait;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::config::GatewaySettings;
use crate::git::repository::ResolvedRepository;
use crate::security::is_allowed_env;

/// Environment applied to every invocation, whatever the caller's own
/// environment says
const SAFETY_ENV: &[(&str, &str)] = &[
    ("GIT_TERMINAL_PROMPT", "0"),
    ("GCM_INTERACTIVE", "never"),
    ("GIT_SSH_COMMAND", "ssh -o BatchMode=yes"),
    ("GIT_PAGER", "cat"),
    ("PAGER", "cat"),
];

/// Variables that point git at a repository; only the resolver may set them
const LOCATION_ENV: &[&str] = &[
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_OBJECT_DIRECTORY",
    "GIT_ALTERNATE_OBJECT_DIRECTORIES",
    "GIT_COMMON_DIR",
    "GIT_NAMESPACE",
];

/// Inherited variables that run programs or inject configuration
const INJECTION_ENV: &[&str] = &[
    "GIT_EXTERNAL_DIFF",
    "GIT_CONFIG_PARAMETERS",
    "GIT_CONFIG_COUNT",
    "GIT_ASKPASS",
    "GIT_EDITOR",
];

const READ_CHUNK: usize = 8192;

/// One request to run the binary
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub repo: &'a ResolvedRepository,
    pub argv: &'a [String],
    /// Extra variables, merged over the safety overrides
    pub env: &'a BTreeMap<String, String>,
}

/// A run that exited unsuccessfully, with whatever it left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRun {
    pub message: String,
    pub exit_code: Option<i32>,
    pub stderr: String,
    pub stdout: String,
}

/// Why an invocation did not produce output
#[derive(Debug)]
pub enum InvocationFailure {
    /// Killed after exceeding the wall-clock budget
    TimedOut,
    /// Killed after stdout and stderr together exceeded the size cap
    OutputLimitExceeded,
    /// The process ran and exited unsuccessfully
    Failed(FailedRun),
    /// Anything else, e.g. the binary could not be spawned
    Other(String),
}

/// Something that can run the version-control binary
#[async_trait]
pub trait GitRunner: Send + Sync {
    async fn run(&self, invocation: Invocation<'_>) -> Result<String, InvocationFailure>;
}

/// Runs git as a child process under a locked-down environment
#[derive(Debug, Clone)]
pub struct GitExecutor {
    binary: String,
    timeout: Duration,
    max_output_bytes: usize,
}

enum Collected {
    Finished {
        status: ExitStatus,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    Overflow,
}

impl GitExecutor {
    /// Create a new GitExecutor with explicit limits
    pub fn new(binary: impl Into<String>, timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            max_output_bytes,
        }
    }

    pub fn from_settings(settings: &GatewaySettings) -> Self {
        Self::new(
            settings.git_binary.clone(),
            settings.timeout(),
            settings.max_output_bytes,
        )
    }

    fn build_command(&self, invocation: &Invocation<'_>) -> Command {
        let repo = invocation.repo;
        let mut command = Command::new(&self.binary);
        command
            .args(invocation.argv)
            .current_dir(repo.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for var in LOCATION_ENV.iter().chain(INJECTION_ENV) {
            command.env_remove(var);
        }
        for (key, value) in SAFETY_ENV {
            command.env(key, value);
        }
        for (key, value) in invocation.env {
            if !is_allowed_env(key) {
                warn!("Ignoring extra environment variable {}", key);
                continue;
            }
            command.env(key, value);
        }

        // Set last so nothing above can redirect the repository
        command
            .env("GIT_DIR", repo.store_dir())
            .env("GIT_WORK_TREE", repo.path());

        command
    }

    fn describe(&self, argv: &[String]) -> String {
        format!("{} {}", self.binary, argv.join(" "))
    }
}

#[async_trait]
impl GitRunner for GitExecutor {
    async fn run(&self, invocation: Invocation<'_>) -> Result<String, InvocationFailure> {
        let description = self.describe(invocation.argv);
        debug!("Running '{}' in {}", description, invocation.repo.path().display());

        let mut child = self.build_command(&invocation).spawn().map_err(|e| {
            InvocationFailure::Other(format!("Failed to execute {}: {}", self.binary, e))
        })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill().await;
            return Err(InvocationFailure::Other(
                "Child process has no output pipes".to_string(),
            ));
        };

        let collected = tokio::select! {
            result = collect_output(&mut child, stdout, stderr, self.max_output_bytes) => Some(result),
            _ = tokio::time::sleep(self.timeout) => None,
        };

        match collected {
            None => {
                warn!("'{}' exceeded {:?}; killing it", description, self.timeout);
                let _ = child.kill().await;
                Err(InvocationFailure::TimedOut)
            }
            Some(Err(e)) => {
                let _ = child.kill().await;
                Err(InvocationFailure::Other(format!(
                    "Failed to read output of {}: {}",
                    self.binary, e
                )))
            }
            Some(Ok(Collected::Overflow)) => {
                warn!(
                    "'{}' produced more than {} bytes; killing it",
                    description, self.max_output_bytes
                );
                let _ = child.kill().await;
                Err(InvocationFailure::OutputLimitExceeded)
            }
            Some(Ok(Collected::Finished {
                status,
                stdout,
                stderr,
            })) => {
                let stdout = String::from_utf8_lossy(&stdout).to_string();
                let stderr = String::from_utf8_lossy(&stderr).to_string();

                if status.success() {
                    return Ok(stdout);
                }

                let message = match status.code() {
                    Some(code) => format!("Command '{}' failed with exit code {}", description, code),
                    None => format!("Command '{}' was terminated by a signal", description),
                };

                Err(InvocationFailure::Failed(FailedRun {
                    message,
                    exit_code: status.code(),
                    stderr,
                    stdout,
                }))
            }
        }
    }
}

/// Drain both pipes, stopping as soon as their combined size passes `limit`
async fn collect_output(
    child: &mut Child,
    mut stdout: ChildStdout,
    mut stderr: ChildStderr,
    limit: usize,
) -> io::Result<Collected> {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let mut out_chunk = [0u8; READ_CHUNK];
    let mut err_chunk = [0u8; READ_CHUNK];
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            read = stdout.read(&mut out_chunk), if out_open => {
                match read? {
                    0 => out_open = false,
                    n => out.extend_from_slice(&out_chunk[..n]),
                }
            }
            read = stderr.read(&mut err_chunk), if err_open => {
                match read? {
                    0 => err_open = false,
                    n => err.extend_from_slice(&err_chunk[..n]),
                }
            }
        }

        if out.len() + err.len() > limit {
            return Ok(Collected::Overflow);
        }
    }

    let status = child.wait().await?;
    Ok(Collected::Finished {
        status,
        stdout: out,
        stderr: err,
    })
}
