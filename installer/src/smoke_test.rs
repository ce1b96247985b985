//! Post-install verification.
//!
//! Runs the installed executable with the formula's test arguments and
//! checks two conditions, in order: the exit code equals the expected code,
//! and standard output contains the expected substring. The exit code is
//! checked first, so an executable that fails but happens to print the
//! expected text still fails verification.

use crate::formula::SmokeTest;
use crate::process::{CommandExecutor, ProcessError};
use camino::Utf8Path;
use log::debug;
use std::fmt;

/// Output captured from the verification command, kept for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Standard error, lossily decoded as UTF-8.
    pub stderr: String,
}

impl fmt::Display for CapturedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- stdout ---")?;
        writeln!(f, "{}", self.stdout.trim_end())?;
        writeln!(f, "--- stderr ---")?;
        write!(f, "{}", self.stderr.trim_end())
    }
}

/// Errors arising from the smoke test.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// The executable exited with the wrong code, or was killed by a signal.
    #[error("smoke test failed: expected exit code {expected}, got {}", describe_code(.actual))]
    UnexpectedExitCode {
        /// The declared exit code.
        expected: i32,
        /// The observed exit code; `None` when terminated by a signal.
        actual: Option<i32>,
        /// What the executable printed.
        output: CapturedOutput,
    },

    /// Standard output did not contain the expected substring.
    #[error("smoke test failed: output does not contain \"{expected}\"")]
    MissingOutput {
        /// The declared substring.
        expected: String,
        /// What the executable printed.
        output: CapturedOutput,
    },

    /// The executable could not be run to completion.
    #[error("smoke test failed: {0}")]
    Process(#[from] ProcessError),
}

impl VerificationError {
    /// The captured output, when the executable ran to completion.
    #[must_use]
    pub const fn captured_output(&self) -> Option<&CapturedOutput> {
        match self {
            Self::UnexpectedExitCode { output, .. } | Self::MissingOutput { output, .. } => {
                Some(output)
            }
            Self::Process(_) => None,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "termination by signal".to_owned(), |c| c.to_string())
}

/// Evidence of a passing smoke test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeTestReport {
    /// The exit code observed.
    pub exit_code: i32,
    /// What the executable printed.
    pub output: CapturedOutput,
}

/// Run the verification command for an installed executable.
///
/// # Errors
///
/// Returns [`VerificationError::UnexpectedExitCode`] when the exit code
/// differs from the declared one, [`VerificationError::MissingOutput`] when
/// standard output lacks the declared substring, and
/// [`VerificationError::Process`] when the executable cannot be started or
/// times out.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use formula_installer::formula::SmokeTest;
/// use formula_installer::process::SystemCommandExecutor;
/// use formula_installer::smoke_test::run_smoke_test;
///
/// let test = SmokeTest::new(vec!["--help".to_owned()], 0, "Usage")?;
/// let report = run_smoke_test(
///     &SystemCommandExecutor::default(),
///     Utf8Path::new("/usr/local/bin/ghclone"),
///     &test,
/// )?;
/// assert_eq!(report.exit_code, 0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn run_smoke_test(
    executor: &dyn CommandExecutor,
    executable: &Utf8Path,
    test: &SmokeTest,
) -> Result<SmokeTestReport, VerificationError> {
    let args: Vec<&str> = test.args().iter().map(String::as_str).collect();
    debug!("running smoke test: {executable} {}", args.join(" "));

    let raw = executor.run(executable.as_str(), &args)?;
    let output = CapturedOutput {
        stdout: String::from_utf8_lossy(&raw.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&raw.stderr).into_owned(),
    };

    let actual = raw.status.code();
    if actual != Some(test.expected_exit_code()) {
        return Err(VerificationError::UnexpectedExitCode {
            expected: test.expected_exit_code(),
            actual,
            output,
        });
    }

    if !output.stdout.contains(test.expected_output()) {
        return Err(VerificationError::MissingOutput {
            expected: test.expected_output().to_owned(),
            output,
        });
    }

    Ok(SmokeTestReport {
        exit_code: test.expected_exit_code(),
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, output_with};
    use rstest::rstest;

    const EXECUTABLE: &str = "/prefix/bin/ghclone";

    fn help_test() -> SmokeTest {
        SmokeTest::new(vec!["--help".to_owned()], 0, "Usage").expect("valid smoke test")
    }

    fn run_with(code: i32, stdout: &str) -> Result<SmokeTestReport, VerificationError> {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: EXECUTABLE,
            args: vec!["--help"],
            result: Ok(output_with(code, stdout, "")),
        }]);
        let result = run_smoke_test(&executor, Utf8Path::new(EXECUTABLE), &help_test());
        executor.assert_finished();
        result
    }

    #[test]
    fn passes_when_usage_is_printed_and_exit_is_zero() {
        let report = run_with(0, "Usage: ghclone <repo>\n").expect("verification passes");
        assert_eq!(report.exit_code, 0);
        assert!(report.output.stdout.contains("Usage"));
    }

    #[test]
    fn fails_when_usage_is_missing() {
        let err = run_with(0, "Help menu\n").expect_err("verification fails");
        assert!(matches!(err, VerificationError::MissingOutput { .. }));
        let output = err.captured_output().expect("output kept");
        assert_eq!(output.stdout, "Help menu\n");
    }

    #[rstest]
    #[case::without_usage("oops\n")]
    #[case::with_usage("Usage: ghclone <repo>\n")]
    fn fails_on_nonzero_exit_regardless_of_output(#[case] stdout: &str) {
        let err = run_with(1, stdout).expect_err("verification fails");
        assert!(matches!(
            err,
            VerificationError::UnexpectedExitCode {
                expected: 0,
                actual: Some(1),
                ..
            }
        ));
        assert!(err.to_string().contains("got 1"));
    }

    #[test]
    fn usage_on_stderr_only_does_not_count() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: EXECUTABLE,
            args: vec!["--help"],
            result: Ok(output_with(0, "", "Usage: ghclone <repo>\n")),
        }]);
        let result = run_smoke_test(&executor, Utf8Path::new(EXECUTABLE), &help_test());
        assert!(matches!(result, Err(VerificationError::MissingOutput { .. })));
    }

    #[test]
    fn process_errors_carry_no_output() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: EXECUTABLE,
            args: vec!["--help"],
            result: Err(ProcessError::TimedOut {
                cmd: EXECUTABLE.to_owned(),
                timeout: std::time::Duration::from_secs(30),
            }),
        }]);
        let err = run_smoke_test(&executor, Utf8Path::new(EXECUTABLE), &help_test())
            .expect_err("timeout fails verification");
        assert!(err.captured_output().is_none());
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn signal_termination_is_described() {
        assert_eq!(describe_code(&None), "termination by signal");
        assert_eq!(describe_code(&Some(2)), "2");
    }

    #[test]
    fn captured_output_renders_both_streams() {
        let output = CapturedOutput {
            stdout: "Help menu\n".to_owned(),
            stderr: "warning\n".to_owned(),
        };
        let text = output.to_string();
        assert!(text.contains("--- stdout ---\nHelp menu"));
        assert!(text.contains("--- stderr ---\nwarning"));
    }
}
