// src/system/executor.rs

use std::collections::HashMap;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use thiserror::Error;

/// Errors running an external program for a completion.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The command line has unbalanced quotes.
    #[error("Command line could not be parsed: {0}")]
    CommandParse(String),
    /// The program name is blank.
    #[error("No command specified to run.")]
    EmptyCommand,
    /// The program could not be spawned.
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    /// The program exited unsuccessfully.
    #[error("Command '{command}' failed: {detail}")]
    NonZeroExitStatus { command: String, detail: String },
}

/// Runs a program and captures its standard output.
///
/// `env_overlay` is added on top of the inherited environment of the child
/// only; the environment of this process is left untouched. Stdin is closed
/// and stderr is captured, since anything printed to the terminal during a
/// completion would corrupt the shell's prompt.
///
/// # Errors
/// Fails when the program cannot be spawned or exits unsuccessfully. In the
/// latter case the first non-empty stderr line (or the exit status) is used as
/// the detail.
pub fn execute_and_capture_output(
    program: &str,
    args: &[String],
    env_overlay: &HashMap<String, String>,
    cwd: Option<&Path>,
) -> Result<Vec<u8>, ExecutionError> {
    let program = program.trim();
    if program.is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }

    let mut command = StdCommand::new(program);
    command
        .args(args)
        .envs(env_overlay)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dunce::simplified(dir));
    }

    log::debug!("Executing '{}' with args {:?}", program, args);
    let output = command
        .output()
        .map_err(|e| ExecutionError::CommandFailed(program.to_string(), e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| output.status.to_string());
        return Err(ExecutionError::NonZeroExitStatus {
            command: program.to_string(),
            detail,
        });
    }

    Ok(output.stdout)
}

/// Splits a command line with POSIX shell rules and runs it like
/// [`execute_and_capture_output`].
pub fn execute_line_and_capture_output(
    command_line: &str,
    env_overlay: &HashMap<String, String>,
    cwd: Option<&Path>,
) -> Result<Vec<u8>, ExecutionError> {
    let trimmed = command_line.trim();
    let parts = shlex::split(trimmed).ok_or_else(|| ExecutionError::CommandParse(trimmed.to_string()))?;
    let (program, args) = parts.split_first().ok_or(ExecutionError::EmptyCommand)?;
    execute_and_capture_output(program, args, env_overlay, cwd)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout() {
        let output = execute_line_and_capture_output("echo hello", &HashMap::new(), None).unwrap();
        assert_eq!(String::from_utf8(output).unwrap().trim(), "hello");
    }

    #[test]
    fn test_runs_in_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = execute_and_capture_output("pwd", &["-P".to_string()], &HashMap::new(), Some(dir.path()))
            .unwrap();
        let expected = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(String::from_utf8(output).unwrap().trim(), expected.to_str().unwrap());
    }

    #[test]
    fn test_env_overlay_reaches_child_only() {
        let overlay = HashMap::from([(
            "QUIVER_EXECUTOR_TEST".to_string(),
            "overlay".to_string(),
        )]);
        let output = execute_and_capture_output("env", &[], &overlay, None).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.lines().any(|l| l == "QUIVER_EXECUTOR_TEST=overlay"));
        assert!(std::env::var("QUIVER_EXECUTOR_TEST").is_err());
    }

    #[test]
    fn test_non_zero_exit_reports_stderr() {
        let err = execute_line_and_capture_output("sh -c 'echo boom >&2; exit 3'", &HashMap::new(), None)
            .unwrap_err();
        match err {
            ExecutionError::NonZeroExitStatus { detail, .. } => assert_eq!(detail, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_program_and_empty_line() {
        assert!(matches!(
            execute_and_capture_output("definitely-not-a-real-program-xyz", &[], &HashMap::new(), None),
            Err(ExecutionError::CommandFailed(..))
        ));
        assert!(matches!(
            execute_line_and_capture_output("   ", &HashMap::new(), None),
            Err(ExecutionError::EmptyCommand)
        ));
        assert!(matches!(
            execute_line_and_capture_output("echo 'unterminated", &HashMap::new(), None),
            Err(ExecutionError::CommandParse(_))
        ));
    }
}
