//! Cooperative cancellation
//!
//! Long loops poll [`CancelToken::is_cancelled`]. While a subprocess is
//! registered and cancellation is still allowed, a cancel request also
//! sends it SIGTERM. The installer registers its child only after the point
//! of no return, so its pid is kept for reporting and is never signalled.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use pkgjob_events::{EventEmitter, EventSender, Status};

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    cancellable: AtomicBool,
    child_pid: AtomicI32,
    sender: Option<EventSender>,
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    #[must_use]
    pub fn new(sender: Option<EventSender>) -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                cancellable: AtomicBool::new(true),
                child_pid: AtomicI32::new(0),
                sender,
            }),
        }
    }

    /// Request cancellation. Only the first request has an effect; returns
    /// whether this call was it.
    pub fn cancel(&self) -> bool {
        if self
            .inner
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        self.emit_status(Status::Cancel);

        if !self.is_cancellable() {
            tracing::debug!("cancel recorded after the point of no return");
            return true;
        }

        let pid = self.inner.child_pid.load(Ordering::SeqCst);
        if pid > 0 {
            if let Err(e) = crate::process::terminate(pid) {
                self.emit_warning(e.to_string());
            }
        }
        true
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Cancellation is no longer honoured (installation started)
    pub fn disallow(&self) {
        self.inner.cancellable.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        self.inner.cancellable.load(Ordering::SeqCst)
    }

    /// Register the running subprocess; `None` clears it.
    pub fn set_child_pid(&self, pid: Option<i32>) {
        self.inner
            .child_pid
            .store(pid.unwrap_or(0), Ordering::SeqCst);
    }

    #[must_use]
    pub fn child_pid(&self) -> Option<i32> {
        match self.inner.child_pid.load(Ordering::SeqCst) {
            pid if pid > 0 => Some(pid),
            _ => None,
        }
    }
}

impl EventEmitter for CancelToken {
    fn event_sender(&self) -> Option<&EventSender> {
        self.inner.sender.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;
    use pkgjob_events::{channel, AppEvent, ProgressEvent};

    #[test]
    fn cancel_is_idempotent() {
        let (tx, mut rx) = channel();
        let token = CancelToken::new(Some(tx));
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());

        let mut cancels = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(
                event,
                AppEvent::Progress(ProgressEvent::StatusChanged {
                    status: Status::Cancel
                })
            ) {
                cancels += 1;
            }
        }
        assert_eq!(cancels, 1);
    }

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new(None);
        let other = token.clone();
        other.disallow();
        assert!(!token.is_cancellable());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn cancel_terminates_registered_child() {
        use std::os::unix::process::ExitStatusExt;

        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let token = CancelToken::new(None);
        token.set_child_pid(Some(i32::try_from(child.id()).unwrap()));

        assert!(token.cancel());
        let status = child.wait().unwrap();
        assert_eq!(status.signal(), Some(Signal::SIGTERM as i32));
    }

    #[test]
    fn child_survives_cancel_after_point_of_no_return() {
        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let token = CancelToken::new(None);
        token.disallow();
        token.set_child_pid(Some(i32::try_from(child.id()).unwrap()));

        assert!(token.cancel());
        assert!(child.try_wait().unwrap().is_none());
        child.kill().unwrap();
        child.wait().unwrap();
    }

    #[test]
    fn child_pid_registration() {
        let token = CancelToken::new(None);
        assert_eq!(token.child_pid(), None);
        token.set_child_pid(Some(4242));
        assert_eq!(token.child_pid(), Some(4242));
        token.set_child_pid(None);
        assert_eq!(token.child_pid(), None);
    }
}
