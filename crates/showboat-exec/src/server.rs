//! Long-lived server processes bound to a pre-selected TCP port.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::ExecError;

/// How long a server block gets to start accepting connections.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

const CONNECT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(100);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Returns an available TCP port.
///
/// # Errors
///
/// Returns [`ExecError::NoFreePort`] when no ephemeral port can be bound.
pub fn free_port() -> Result<u16, ExecError> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .map_err(|source| ExecError::NoFreePort { source })?;
    let port = listener
        .local_addr()
        .map_err(|source| ExecError::NoFreePort { source })?
        .port();
    drop(listener);
    Ok(port)
}

/// Polls until a TCP connection to `port` on localhost succeeds.
///
/// # Errors
///
/// Returns [`ExecError::PortTimeout`] when the deadline elapses without a
/// successful connection.
pub fn wait_for_port(port: u16, timeout: Duration) -> Result<(), ExecError> {
    let deadline = Instant::now() + timeout;
    let address = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    while Instant::now() < deadline {
        if let Ok(connection) = TcpStream::connect_timeout(&address, CONNECT_ATTEMPT_TIMEOUT) {
            drop(connection);
            return Ok(());
        }
        thread::sleep(POLL_INTERVAL);
    }
    Err(ExecError::port_timeout(port, timeout))
}

/// A running server process that is stopped on drop.
///
/// Stopping is idempotent: [`ServerProcess::stop`] is safe to call on an
/// already-stopped process, and dropping the handle stops the process on
/// every exit path of the caller.
#[derive(Debug)]
pub struct ServerProcess {
    child: Option<Child>,
    port: u16,
}

impl ServerProcess {
    /// Starts `interpreter -c code` with `PORT` set to `port` and waits for
    /// the port to accept connections.
    ///
    /// The server's stdout and stderr are routed to the parent's stderr so
    /// they cannot interfere with captured output on stdout.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Launch`] when the process cannot be started and
    /// [`ExecError::PortTimeout`] when the port never opens within `timeout`;
    /// in the latter case the child is killed before returning.
    pub fn start(
        interpreter: &str,
        code: &str,
        workdir: Option<&Path>,
        port: u16,
        timeout: Duration,
    ) -> Result<Self, ExecError> {
        let mut command = Command::new(interpreter);
        command
            .arg("-c")
            .arg(code)
            .env("PORT", port.to_string())
            .stdout(stderr_stdio())
            .stderr(stderr_stdio());
        if let Some(workdir) = workdir {
            command.current_dir(workdir);
        }

        let child = command
            .spawn()
            .map_err(|source| ExecError::launch(interpreter, source))?;
        let mut server = Self {
            child: Some(child),
            port,
        };
        debug!(port, "server process started, waiting for readiness");

        if let Err(error) = wait_for_port(port, timeout) {
            server.stop();
            return Err(error);
        }
        Ok(server)
    }

    /// The port the server was bound to.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Kills the server process and reaps it. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _unused = child.kill();
            let _unused = child.wait();
            debug!(port = self.port, "server process stopped");
        }
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A [`Stdio`] writing to the parent's stderr.
#[cfg(unix)]
fn stderr_stdio() -> Stdio {
    use std::os::fd::AsFd;

    io::stderr()
        .as_fd()
        .try_clone_to_owned()
        .map_or_else(|_| Stdio::null(), Stdio::from)
}

#[cfg(not(unix))]
fn stderr_stdio() -> Stdio {
    Stdio::null()
}
