//! Shared test utilities for the installer crate.

use crate::process::{CommandExecutor, ProcessError};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a command `Output` with the given exit code and streams.
#[must_use]
pub fn output_with(code: i32, stdout: &str, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "/prefix/bin/ghclone").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<&'static str>,
    /// The result to return when this command is invoked.
    pub result: Result<Output, ProcessError>,
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output, ProcessError> {
        let mut expected = self.expected.borrow_mut();
        let call = expected.pop_front().expect("unexpected command invocation");

        assert_eq!(call.cmd, cmd);
        assert_eq!(call.args.as_slice(), args);

        call.result
    }
}

/// Answers every invocation with the same output, recording each command.
///
/// Useful when the executable path is only known at run time, such as an
/// install into a temporary prefix.
#[derive(Debug)]
pub struct CannedExecutor {
    output: Output,
    calls: RefCell<Vec<String>>,
}

impl CannedExecutor {
    /// Creates an executor that always returns `output`.
    #[must_use]
    pub fn new(output: Output) -> Self {
        Self {
            output,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Commands run so far, each rendered as `cmd arg...`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandExecutor for CannedExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output, ProcessError> {
        let mut line = cmd.to_owned();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.borrow_mut().push(line);
        Ok(self.output.clone())
    }
}

/// Builds `.tar.gz` fixtures shaped like release tarballs.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: Vec<(String, Vec<u8>, u32)>,
}

impl ArchiveBuilder {
    /// Start an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a regular, non-executable file.
    #[must_use]
    pub fn file(mut self, name: &str, contents: &[u8]) -> Self {
        self.entries.push((name.to_owned(), contents.to_vec(), 0o644));
        self
    }

    /// Add an executable file.
    #[must_use]
    pub fn executable(mut self, name: &str, contents: &[u8]) -> Self {
        self.entries.push((name.to_owned(), contents.to_vec(), 0o755));
        self
    }

    /// Write the archive to `path` as a gzip-compressed tarball.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from creating or writing the archive.
    pub fn write_tar_gz(&self, path: &Path) -> io::Result<()> {
        let output = std::fs::File::create(path)?;
        let encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, contents, mode) in &self.entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, name, contents.as_slice())?;
        }
        let encoder = builder.into_inner()?;
        encoder.finish()?;
        Ok(())
    }
}

/// Write an executable `/bin/sh` script with the given body.
///
/// # Errors
///
/// Returns any I/O error from writing the file or changing its mode.
pub fn write_script(path: &Path, body: &str) -> io::Result<()> {
    std::fs::write(path, format!("#!/bin/sh\n{body}\n"))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}
