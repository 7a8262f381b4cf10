//! CLI argument definitions for the showboat tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line interface for the showboat demo-document tool.
#[derive(Parser, Debug)]
#[command(name = "showboat", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Working directory for executed code blocks.
    #[arg(long, global = true, value_name = "DIR")]
    pub(crate) workdir: Option<PathBuf>,
    /// The operation to perform.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Subcommands of the showboat CLI.
#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Creates a new demo document with a title block.
    Init {
        /// Path of the document to create.
        file: PathBuf,
        /// Document title.
        title: String,
    },
    /// Appends commentary, from the argument or from stdin.
    Note {
        /// Path of the document.
        file: PathBuf,
        /// Commentary text; read from stdin when omitted.
        text: Option<String>,
    },
    /// Runs code, appends it with its captured output, and prints the output.
    Exec {
        /// Path of the document.
        file: PathBuf,
        /// Interpreter the code is run with, such as `bash` or `python3`.
        language: String,
        /// The code to run; read from stdin when omitted.
        code: Option<String>,
        /// Shell command the captured output is piped through.
        #[arg(long, value_name = "COMMAND")]
        filter: Option<String>,
    },
    /// Copies an image next to the document and appends its reference.
    Image {
        /// Path of the document.
        file: PathBuf,
        /// Image path, or a markdown `![alt](path)` reference.
        image: String,
    },
    /// Re-executes every code block and reports output drift.
    Verify {
        /// Path of the document.
        file: PathBuf,
        /// Writes a refreshed copy here; the input file is never modified.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Fixed port for server blocks instead of an auto-assigned one.
        #[arg(long, value_name = "PORT")]
        wait_port: Option<u16>,
    },
    /// Removes the most recent entry from the document.
    Pop {
        /// Path of the document.
        file: PathBuf,
    },
    /// Prints the commands whose replay would rebuild the document.
    Extract {
        /// Path of the document.
        file: PathBuf,
        /// Document path substituted into the emitted commands.
        #[arg(long, value_name = "NAME")]
        filename: Option<String>,
    },
    /// Starts the document's first server block and waits for termination.
    Server {
        /// Path of the document.
        file: PathBuf,
        /// Fixed port instead of an auto-assigned one.
        #[arg(long, value_name = "PORT")]
        wait_port: Option<u16>,
    },
}
