//! Interpreter execution with combined output capture.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use crate::error::ExecError;

/// Options applied to a single code execution.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Working directory for the child process. Current directory when unset.
    pub workdir: Option<PathBuf>,
    /// Value injected as the `PORT` environment variable.
    pub port: Option<u16>,
    /// Shell command the captured output is piped through before being
    /// returned. The exit code reported stays the interpreter's own.
    pub filter: Option<String>,
}

/// Captured result of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Combined stdout and stderr, newline-terminated when non-empty.
    pub output: String,
    /// The interpreter's exit code. Non-zero exit is data, not failure.
    pub exit_code: i32,
}

/// Executes `interpreter -c code` and captures its combined output.
///
/// Standard output and standard error are both captured; the capture is
/// newline-normalised so stored output always ends the way the document
/// format expects. When [`RunOptions::filter`] is set the capture is piped
/// through `bash -c <filter>` and the filter's stdout replaces it.
///
/// # Errors
///
/// Returns [`ExecError::Launch`] when the interpreter cannot be started and
/// [`ExecError::Filter`] when the filter pipeline fails to run. A non-zero
/// exit code from the code itself is returned inside [`Capture`].
pub fn run(interpreter: &str, code: &str, options: &RunOptions) -> Result<Capture, ExecError> {
    let mut command = Command::new(interpreter);
    command.arg("-c").arg(code);
    if let Some(workdir) = &options.workdir {
        command.current_dir(workdir);
    }
    if let Some(port) = options.port {
        command.env("PORT", port.to_string());
    }

    let captured = command
        .output()
        .map_err(|source| ExecError::launch(interpreter, source))?;

    let mut output = String::from_utf8_lossy(&captured.stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&captured.stderr));
    let exit_code = captured.status.code().unwrap_or(1);

    if let Some(filter) = &options.filter {
        output = apply_filter(filter, &output, options)?;
    }

    Ok(Capture {
        output: ensure_trailing_newline(output),
        exit_code,
    })
}

/// Pipes `input` through `bash -c <filter>` and returns the filter's stdout.
fn apply_filter(filter: &str, input: &str, options: &RunOptions) -> Result<String, ExecError> {
    let mut command = Command::new("bash");
    command
        .arg("-c")
        .arg(filter)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(workdir) = &options.workdir {
        command.current_dir(workdir);
    }
    if let Some(port) = options.port {
        command.env("PORT", port.to_string());
    }

    let mut child = command
        .spawn()
        .map_err(|source| ExecError::filter(filter, source))?;

    if let Some(mut stdin) = child.stdin.take() {
        let bytes = input.as_bytes().to_vec();
        // Feed stdin from a helper thread so a filter that emits more than a
        // pipe buffer before reading its input cannot deadlock the capture.
        thread::spawn(move || {
            let _unused = stdin.write_all(&bytes);
        });
    }

    let captured = child
        .wait_with_output()
        .map_err(|source| ExecError::filter(filter, source))?;

    let mut output = String::from_utf8_lossy(&captured.stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&captured.stderr));
    Ok(output)
}

/// Appends a trailing newline to a non-empty capture that lacks one, keeping
/// stored output comparable across capture, write, and re-parse.
fn ensure_trailing_newline(mut output: String) -> String {
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn captures_stdout() {
        let capture = run("bash", "echo hello", &RunOptions::default()).expect("run");
        assert_eq!(capture.output, "hello\n");
        assert_eq!(capture.exit_code, 0);
    }

    #[test]
    fn captures_stderr() {
        let capture = run("bash", "echo oops >&2", &RunOptions::default()).expect("run");
        assert_eq!(capture.output, "oops\n");
        assert_eq!(capture.exit_code, 0);
    }

    #[test]
    fn nonzero_exit_is_data_not_error() {
        let capture =
            run("bash", "echo fail output && exit 42", &RunOptions::default()).expect("run");
        assert_eq!(capture.output, "fail output\n");
        assert_eq!(capture.exit_code, 42);
    }

    #[test]
    fn missing_interpreter_is_a_launch_error() {
        let result = run("showboat-no-such-interpreter", "true", &RunOptions::default());
        assert!(matches!(result, Err(ExecError::Launch { .. })));
    }

    #[test]
    fn workdir_changes_the_child_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let options = RunOptions {
            workdir: Some(dir.path().to_path_buf()),
            ..RunOptions::default()
        };
        let capture = run("bash", "pwd", &options).expect("run");
        let reported = capture.output.trim_end();
        let canonical = dir.path().canonicalize().expect("canonicalize");
        assert_eq!(
            std::path::Path::new(reported).canonicalize().expect("canonicalize"),
            canonical
        );
    }

    #[test]
    fn port_is_injected_into_the_environment() {
        let options = RunOptions {
            port: Some(8123),
            ..RunOptions::default()
        };
        let capture = run("bash", "echo $PORT", &options).expect("run");
        assert_eq!(capture.output, "8123\n");
    }

    #[test]
    fn filter_rewrites_the_capture() {
        let options = RunOptions {
            filter: Some("tr a-z A-Z".to_owned()),
            ..RunOptions::default()
        };
        let capture = run("bash", "echo hello", &options).expect("run");
        assert_eq!(capture.output, "HELLO\n");
        assert_eq!(capture.exit_code, 0);
    }

    #[test]
    fn exit_code_survives_filtering() {
        let options = RunOptions {
            filter: Some("cat".to_owned()),
            ..RunOptions::default()
        };
        let capture = run("bash", "echo out && exit 7", &options).expect("run");
        assert_eq!(capture.output, "out\n");
        assert_eq!(capture.exit_code, 7);
    }

    #[rstest]
    #[case("", "")]
    #[case("hello\n", "hello\n")]
    #[case("hello", "hello\n")]
    #[case("a\nb", "a\nb\n")]
    fn trailing_newline_normalisation(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(ensure_trailing_newline(input.to_owned()), expected);
    }
}
