//! Command-line runtime for the showboat demo-document tool.
//!
//! Owns argument parsing, telemetry bootstrapping, and dispatch to the
//! document operations. The binary entrypoint delegates here so the dispatch
//! logic stays testable.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use showboat_ops::VerifyOptions;

mod cli;
mod errors;
mod telemetry;

use cli::{Cli, Command};
use errors::AppError;

/// Parses arguments, runs the requested operation, and maps its outcome to
/// a process exit code.
#[must_use]
pub fn run() -> ExitCode {
    telemetry::initialise();
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("showboat: {error}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<ExitCode, AppError> {
    let workdir = cli.workdir;
    match cli.command {
        Command::Init { file, title } => {
            showboat_ops::init(&file, &title, Some(env!("CARGO_PKG_VERSION")))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Note { file, text } => {
            let text = argument_or_stdin(text)?;
            showboat_ops::note(&file, &text)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Exec {
            file,
            language,
            code,
            filter,
        } => run_exec(&file, &language, code, filter.as_deref(), workdir.as_deref()),
        Command::Image { file, image } => {
            showboat_ops::image(&file, &image)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify {
            file,
            output,
            wait_port,
        } => run_verify(&file, output, wait_port, workdir),
        Command::Pop { file } => {
            showboat_ops::pop(&file)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Extract { file, filename } => run_extract(&file, filename.as_deref()),
        Command::Server { file, wait_port } => run_server(&file, wait_port, workdir.as_deref()),
    }
}

/// Runs one code block and relays both its output and its exit code.
fn run_exec(
    file: &Path,
    language: &str,
    code: Option<String>,
    filter: Option<&str>,
    workdir: Option<&Path>,
) -> Result<ExitCode, AppError> {
    let code = argument_or_stdin(code)?;
    let capture = showboat_ops::exec(file, language, &code, filter, workdir)?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(capture.output.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(AppError::WriteOutput)?;
    Ok(exit_code_from(capture.exit_code))
}

fn run_verify(
    file: &Path,
    output: Option<PathBuf>,
    wait_port: Option<u16>,
    workdir: Option<PathBuf>,
) -> Result<ExitCode, AppError> {
    let options = VerifyOptions {
        output_path: output,
        workdir,
        wait_port,
    };
    let diffs = showboat_ops::verify(file, &options)?;
    if diffs.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    let mut stdout = io::stdout().lock();
    for diff in &diffs {
        writeln!(stdout, "{diff}").map_err(AppError::WriteOutput)?;
    }
    stdout.flush().map_err(AppError::WriteOutput)?;
    Ok(ExitCode::FAILURE)
}

fn run_extract(file: &Path, filename: Option<&str>) -> Result<ExitCode, AppError> {
    let commands = showboat_ops::extract(file, filename)?;
    let mut stdout = io::stdout().lock();
    for command in &commands {
        writeln!(stdout, "{command}").map_err(AppError::WriteOutput)?;
    }
    stdout.flush().map_err(AppError::WriteOutput)?;
    Ok(ExitCode::SUCCESS)
}

/// Starts the document's server block, announces its port, and keeps it
/// alive until the process is told to terminate.
fn run_server(
    file: &Path,
    wait_port: Option<u16>,
    workdir: Option<&Path>,
) -> Result<ExitCode, AppError> {
    let server = showboat_ops::start_server(file, workdir, wait_port)?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "Server running on port {}", server.port())
        .and_then(|()| stdout.flush())
        .map_err(AppError::WriteOutput)?;
    drop(stdout);

    wait_for_termination()?;
    // Dropping the handle stops the server process.
    drop(server);
    Ok(ExitCode::SUCCESS)
}

#[cfg(unix)]
fn wait_for_termination() -> Result<(), AppError> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(AppError::InstallSignals)?;
    if let Some(signal) = signals.forever().next() {
        tracing::info!(signal, "termination signal received");
    }
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_termination() -> Result<(), AppError> {
    loop {
        std::thread::park();
    }
}

/// Uses the positional argument when given, otherwise reads stdin to the
/// end. Trailing newlines from stdin are stripped so piped input does not
/// leave blank lines in the document.
fn argument_or_stdin(argument: Option<String>) -> Result<String, AppError> {
    argument.map_or_else(
        || {
            io::read_to_string(io::stdin())
                .map(|text| text.trim_end_matches('\n').to_owned())
                .map_err(AppError::ReadStdin)
        },
        Ok,
    )
}

fn exit_code_from(code: i32) -> ExitCode {
    ExitCode::from(exit_code_value(code))
}

/// Maps a subprocess exit code onto the range a process exit status can
/// carry; out-of-range codes become a generic failure.
fn exit_code_value(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_passes_small_codes_through() {
        assert_eq!(exit_code_value(0), 0);
        assert_eq!(exit_code_value(42), 42);
    }

    #[test]
    fn exit_code_clamps_out_of_range_codes_to_failure() {
        assert_eq!(exit_code_value(-1), 1);
        assert_eq!(exit_code_value(300), 1);
    }
}
