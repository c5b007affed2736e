//! External command execution.
//!
//! Commands are spawned directly rather than through a shell so that
//! package names and paths never need quoting.

use crate::error::{NbenvError, Result};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

/// Result of executing an external command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
        }
    }

    /// The last `lines` lines of stderr, for error messages.
    pub fn stderr_tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.stderr.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Capture stdout (if false, inherits from parent).
    pub capture_stdout: bool,

    /// Capture stderr (if false, inherits from parent).
    pub capture_stderr: bool,
}

impl CommandOptions {
    /// Options that capture both output streams.
    pub fn captured() -> Self {
        Self {
            capture_stdout: true,
            capture_stderr: true,
            ..Default::default()
        }
    }
}

/// Render a program and its arguments for logs and error messages.
pub fn describe<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(
        args.iter()
            .map(|a| a.as_ref().to_string_lossy().into_owned()),
    );
    parts.join(" ")
}

/// Execute a program with arguments.
///
/// A non-zero exit is reported through [`CommandResult::success`], not as an
/// error. Failing to start the program is an error.
pub fn execute<S: AsRef<OsStr>>(
    program: &str,
    args: &[S],
    options: &CommandOptions,
) -> Result<CommandResult> {
    let start = Instant::now();
    let rendered = describe(program, args);
    debug!("Running: {}", rendered);

    let mut cmd = Command::new(program);
    cmd.args(args);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    if options.capture_stdout {
        cmd.stdout(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit());
    }

    if options.capture_stderr {
        cmd.stderr(Stdio::piped());
    } else {
        cmd.stderr(Stdio::inherit());
    }

    let output = cmd.output().map_err(|e| {
        debug!("Failed to start {}: {}", program, e);
        NbenvError::CommandFailed {
            command: rendered.clone(),
            code: None,
        }
    })?;

    let duration = start.elapsed();

    let stdout = if options.capture_stdout {
        String::from_utf8_lossy(&output.stdout).to_string()
    } else {
        String::new()
    };

    let stderr = if options.capture_stderr {
        String::from_utf8_lossy(&output.stderr).to_string()
    } else {
        String::new()
    };

    debug!(
        "{} exited with {:?} after {:?}",
        program,
        output.status.code(),
        duration
    );

    if output.status.success() {
        Ok(CommandResult::success(stdout, stderr, duration))
    } else {
        Ok(CommandResult::failure(
            output.status.code(),
            stdout,
            stderr,
            duration,
        ))
    }
}

/// Execute a program and return whether it succeeded.
pub fn execute_check<S: AsRef<OsStr>>(program: &str, args: &[S], cwd: Option<&Path>) -> bool {
    let options = CommandOptions {
        cwd: cwd.map(|p| p.to_path_buf()),
        ..CommandOptions::captured()
    };

    execute(program, args, &options)
        .map(|r| r.success)
        .unwrap_or(false)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn execute_successful_command() {
        let result = execute("sh", &["-c", "echo hello"], &CommandOptions::captured()).unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[test]
    fn execute_failing_command() {
        let result = execute("sh", &["-c", "exit 3"], &CommandOptions::captured()).unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[test]
    fn arguments_are_not_shell_expanded() {
        let result = execute("echo", &["$HOME", "a b"], &CommandOptions::captured()).unwrap();

        assert_eq!(result.stdout.trim_end(), "$HOME a b");
    }

    #[test]
    fn execute_with_env() {
        let mut options = CommandOptions::captured();
        options
            .env
            .insert("NBENV_TEST_VAR".to_string(), "my_value".to_string());

        let result = execute("sh", &["-c", "echo $NBENV_TEST_VAR"], &options).unwrap();

        assert!(result.success);
        assert!(result.stdout.contains("my_value"));
    }

    #[test]
    fn execute_with_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let options = CommandOptions {
            cwd: Some(temp.path().to_path_buf()),
            ..CommandOptions::captured()
        };

        let result = execute::<&str>("pwd", &[], &options).unwrap();

        assert!(result.success);
    }

    #[test]
    fn missing_program_is_an_error() {
        let err = execute::<&str>("nbenv-definitely-not-installed", &[], &CommandOptions::captured())
            .unwrap_err();
        assert!(matches!(err, NbenvError::CommandFailed { code: None, .. }));
    }

    #[test]
    fn start_failure_names_the_full_command() {
        let err = execute(
            "nbenv-definitely-not-installed",
            &["--project=/tmp/env", "-e", "1"],
            &CommandOptions::captured(),
        )
        .unwrap_err();
        match err {
            NbenvError::CommandFailed { command, .. } => {
                assert_eq!(command, "nbenv-definitely-not-installed --project=/tmp/env -e 1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn execute_check_returns_bool() {
        assert!(execute_check("sh", &["-c", "exit 0"], None));
        assert!(!execute_check("sh", &["-c", "exit 1"], None));
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let result = execute(
            "sh",
            &["-c", "echo one >&2; echo two >&2; echo three >&2; exit 1"],
            &CommandOptions::captured(),
        )
        .unwrap();
        assert_eq!(result.stderr_tail(2), "two\nthree");
    }

    #[test]
    fn describe_joins_program_and_args() {
        assert_eq!(describe("julia", &["-e", "1"]), "julia -e 1");
    }
}
