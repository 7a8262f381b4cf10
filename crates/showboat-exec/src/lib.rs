//! Subprocess execution, server lifecycle, and image capture for showboat.
//!
//! The crate wraps three collaborators the document tooling depends on:
//! running an interpreter with code and capturing its combined output,
//! managing a long-lived server process bound to a pre-selected TCP port,
//! and copying generated images into place with stable generated names.

mod error;
mod image;
mod runner;
mod server;

pub use error::ExecError;
pub use image::copy_image;
pub use runner::{Capture, RunOptions, run};
pub use server::{DEFAULT_READY_TIMEOUT, ServerProcess, free_port, wait_for_port};
