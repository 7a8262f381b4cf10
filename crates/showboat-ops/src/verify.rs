//! Re-execution and drift detection.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use showboat_exec::{DEFAULT_READY_TIMEOUT, RunOptions, ServerProcess, free_port, run};
use showboat_markdown::{Block, OutputBlock};

use crate::document::{read_blocks, write_blocks};
use crate::error::OpsError;

/// A mismatch between a code block's stored output and its fresh re-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    /// Index of the drifted code block in the document's block sequence.
    pub block_index: usize,
    /// The output recorded in the document.
    pub expected: String,
    /// The output the re-run actually produced.
    pub actual: String,
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block {}:\n  expected: {}\n  actual:   {}",
            self.block_index,
            self.expected.trim_end_matches('\n'),
            self.actual.trim_end_matches('\n'),
        )
    }
}

/// Options applied to one verification run.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// When set, the refreshed document is written here; the input file is
    /// never touched either way.
    pub output_path: Option<PathBuf>,
    /// Working directory for re-executed blocks.
    pub workdir: Option<PathBuf>,
    /// Fixed port for server blocks instead of an auto-assigned one.
    pub wait_port: Option<u16>,
}

/// Re-executes every code block in document order and collects all drift.
///
/// Image blocks are skipped (re-verifying generated images is an accepted
/// limitation). Server blocks are started in the background: the first one
/// fixes the run's shared port, each must accept connections before any
/// later block runs, and every started server is stopped when verification
/// ends on any path. All blocks executed after a port is assigned receive it
/// via the `PORT` environment variable. The pass never stops at the first
/// mismatch, so the caller sees every drifted block at once.
///
/// # Errors
///
/// Returns exec errors when a block or server cannot be run at all, a
/// timeout error when a server never becomes ready, and read/parse/write
/// failures. Drift itself is reported in the returned list, not as an error.
pub fn verify(path: &Path, options: &VerifyOptions) -> Result<Vec<Diff>, OpsError> {
    let mut blocks = read_blocks(path)?;
    let mut diffs = Vec::new();
    // Dropped on every exit path, stopping each started server.
    let mut servers: Vec<ServerProcess> = Vec::new();
    let mut port = options.wait_port;

    for index in 0..blocks.len() {
        let Some(code) = blocks.get(index).and_then(Block::as_code) else {
            continue;
        };
        if code.is_image {
            continue;
        }

        if code.is_server {
            let assigned = match port {
                Some(assigned) => assigned,
                None => {
                    let fresh = free_port()?;
                    port = Some(fresh);
                    fresh
                }
            };
            let server = ServerProcess::start(
                &code.language,
                &code.code,
                options.workdir.as_deref(),
                assigned,
                DEFAULT_READY_TIMEOUT,
            )?;
            servers.push(server);
            continue;
        }

        debug!(index, language = %code.language, "re-executing block");
        let run_options = RunOptions {
            workdir: options.workdir.clone(),
            port,
            filter: code.filter.clone(),
        };
        let capture = run(&code.language, &code.code, &run_options)?;

        if let Some(stored) = blocks.get(index + 1).and_then(Block::as_output) {
            if stored.content != capture.output {
                diffs.push(Diff {
                    block_index: index,
                    expected: stored.content.clone(),
                    actual: capture.output.clone(),
                });
            }
            // The refreshed copy gets the fresh capture even when it matches.
            if let Some(slot) = blocks.get_mut(index + 1) {
                *slot = Block::Output(OutputBlock {
                    content: capture.output,
                    language: stored_language(slot),
                });
            }
        }
    }

    if let Some(output_path) = &options.output_path {
        write_blocks(output_path, &blocks)?;
    }

    Ok(diffs)
}

fn stored_language(block: &Block) -> Option<String> {
    block.as_output().and_then(|output| output.language.clone())
}

/// Starts the document's first server block and returns its handle.
///
/// The port is `wait_port` when given, otherwise auto-assigned. The server
/// must accept connections within the readiness deadline. The caller owns
/// the handle; dropping it stops the server.
///
/// # Errors
///
/// Returns [`OpsError::NoServerBlock`] when the document has no server
/// block, plus exec and read/parse failures.
pub fn start_server(
    path: &Path,
    workdir: Option<&Path>,
    wait_port: Option<u16>,
) -> Result<ServerProcess, OpsError> {
    let blocks = read_blocks(path)?;

    for block in &blocks {
        let Some(code) = block.as_code() else {
            continue;
        };
        if !code.is_server {
            continue;
        }

        let port = match wait_port {
            Some(port) => port,
            None => free_port()?,
        };
        let server = ServerProcess::start(
            &code.language,
            &code.code,
            workdir,
            port,
            DEFAULT_READY_TIMEOUT,
        )?;
        return Ok(server);
    }

    Err(OpsError::NoServerBlock {
        path: path.to_path_buf(),
    })
}
