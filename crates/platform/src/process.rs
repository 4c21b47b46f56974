//! Signals to job subprocesses

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use pkgjob_errors::Error;

/// Ask a child process to terminate
///
/// # Errors
///
/// Returns an internal error if the pid is not positive or `kill(2)` fails.
pub fn terminate(pid: i32) -> Result<(), Error> {
    if pid <= 0 {
        return Err(Error::internal(format!("refusing to signal pid {pid}")));
    }
    signal::kill(Pid::from_raw(pid), Signal::SIGTERM)
        .map_err(|e| Error::internal(format!("failed to send SIGTERM to {pid}: {e}")))
}
