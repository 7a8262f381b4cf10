//! Document operations for showboat demo files.
//!
//! This crate ties the markdown model to process execution: the append-only
//! editing operations (`init`, `note`, `exec`, `image`, `pop`), the
//! re-execution verifier, the shell-script extractor, and best-effort
//! notification of a remote collector.

mod document;
mod error;
mod extract;
mod remote;
mod verify;

pub use document::{exec, image, init, note, pop, read_blocks};
pub use error::OpsError;
pub use extract::extract;
pub use remote::REMOTE_URL_ENV;
pub use verify::{Diff, VerifyOptions, start_server, verify};
