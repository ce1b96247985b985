//! Running external commands with a deadline.
//!
//! The smoke test is the only place a subprocess is spawned. It goes through
//! the [`CommandExecutor`] trait so tests can substitute canned output.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default deadline for a smoke-test command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors arising while running an external command.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The command could not be started.
    #[error("failed to run {cmd}: {source}")]
    Spawn {
        /// The program that was invoked.
        cmd: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The command did not finish before the deadline and was killed.
    #[error("{cmd} timed out after {} seconds", .timeout.as_secs())]
    TimedOut {
        /// The program that was invoked.
        cmd: String,
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// Waiting for the command or collecting its output failed.
    #[error("I/O error while running command: {0}")]
    Io(#[from] io::Error),
}

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when the command cannot be started, exceeds
    /// its deadline, or its output cannot be collected.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use formula_installer::process::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor::default();
    /// let output = executor.run("/usr/local/bin/ghclone", &["--help"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), formula_installer::process::ProcessError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output, ProcessError>;
}

/// Executes commands on the host system with a timeout.
///
/// Standard output and standard error are redirected to anonymous temporary
/// files rather than pipes, so a chatty child can never block on a full pipe
/// while the parent waits for it.
#[derive(Debug, Clone, Copy)]
pub struct SystemCommandExecutor {
    timeout: Duration,
}

impl SystemCommandExecutor {
    /// Create an executor with a custom deadline.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The configured deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SystemCommandExecutor {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output, ProcessError> {
        let mut stdout = tempfile::tempfile()?;
        let mut stderr = tempfile::tempfile()?;

        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout.try_clone()?))
            .stderr(Stdio::from(stderr.try_clone()?))
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                cmd: cmd.to_owned(),
                source,
            })?;

        match child.wait_timeout(self.timeout)? {
            Some(status) => Ok(Output {
                status,
                stdout: read_back(&mut stdout)?,
                stderr: read_back(&mut stderr)?,
            }),
            None => {
                // Timeout - kill the process
                let _ = child.kill();
                let _ = child.wait();
                Err(ProcessError::TimedOut {
                    cmd: cmd.to_owned(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

fn read_back(file: &mut File) -> io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(0))?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    Ok(buffer)
}
