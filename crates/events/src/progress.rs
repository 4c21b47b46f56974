//! Phase-aware percentage reporting
//!
//! A job moves through phases (loading the cache, resolving, downloading,
//! installing). Within one phase the reported percentage only moves forward.
//! Entering a different phase starts counting again from zero.

use crate::{AppEvent, EventEmitter, EventSender, ProgressEvent, Status};

#[derive(Debug, Clone)]
pub struct PhaseProgress {
    sender: Option<EventSender>,
    status: Option<Status>,
    last: Option<u8>,
}

impl PhaseProgress {
    #[must_use]
    pub fn new(sender: Option<EventSender>) -> Self {
        Self {
            sender,
            status: None,
            last: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<Status> {
        self.status
    }

    /// Last percentage reported in the current phase
    #[must_use]
    pub fn percentage(&self) -> Option<u8> {
        self.last
    }

    /// Enter a phase. Re-entering the current phase emits nothing.
    pub fn set_status(&mut self, status: Status) {
        if self.status == Some(status) {
            return;
        }
        self.status = Some(status);
        self.last = None;
        self.emit(AppEvent::Progress(ProgressEvent::StatusChanged { status }));
    }

    /// Report a percentage; values at or below the last one are dropped.
    /// Returns whether an event was sent.
    pub fn set_percentage(&mut self, value: u8) -> bool {
        let value = value.min(100);
        if self.last.is_some_and(|last| value <= last) {
            return false;
        }
        self.last = Some(value);
        self.emit(AppEvent::Progress(ProgressEvent::Percentage {
            value: Some(value),
        }));
        true
    }

    /// Report `done / total` as a percentage
    pub fn set_ratio(&mut self, done: usize, total: usize) -> bool {
        if total == 0 {
            return false;
        }
        let pct = (done.min(total) * 100) / total;
        self.set_percentage(u8::try_from(pct).unwrap_or(100))
    }

    /// Tell the client the percentage is unknown from now on
    pub fn invalidate(&mut self) {
        self.last = None;
        self.emit(AppEvent::Progress(ProgressEvent::Percentage { value: None }));
    }
}

impl EventEmitter for PhaseProgress {
    fn event_sender(&self) -> Option<&EventSender> {
        self.sender.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel;

    fn percentages(rx: &mut crate::EventReceiver) -> Vec<Option<u8>> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Progress(ProgressEvent::Percentage { value }) = event {
                out.push(value);
            }
        }
        out
    }

    #[test]
    fn percentage_is_monotonic_within_phase() {
        let (tx, mut rx) = channel();
        let mut progress = PhaseProgress::new(Some(tx));
        progress.set_status(Status::Running);
        assert!(progress.set_percentage(10));
        assert!(!progress.set_percentage(5));
        assert!(!progress.set_percentage(10));
        assert!(progress.set_percentage(250));
        assert_eq!(percentages(&mut rx), vec![Some(10), Some(100)]);
    }

    #[test]
    fn new_phase_resets() {
        let (tx, mut rx) = channel();
        let mut progress = PhaseProgress::new(Some(tx));
        progress.set_status(Status::Download);
        progress.set_percentage(80);
        progress.set_status(Status::Install);
        assert!(progress.set_percentage(3));
        progress.set_status(Status::Install);
        assert_eq!(progress.percentage(), Some(3));
        assert_eq!(percentages(&mut rx), vec![Some(80), Some(3)]);
    }

    #[test]
    fn ratio_handles_empty_totals() {
        let mut progress = PhaseProgress::new(None);
        assert!(!progress.set_ratio(0, 0));
        assert!(progress.set_ratio(1, 3));
        assert_eq!(progress.percentage(), Some(33));
    }
}
