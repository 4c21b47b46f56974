//! Fetch progress reporting

use pkgjob_events::{EventEmitter, EventSender, PhaseProgress, Status};
use pkgjob_platform::CancelToken;

use crate::fetch::FetchItem;

/// One progress sample from a running queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchPulse {
    pub current_bytes: u64,
    pub current_items: u64,
    pub total_bytes: u64,
    pub total_items: u64,
    pub bytes_per_second: u64,
}

impl FetchPulse {
    /// Items count as one byte each so that empty archives still move the bar
    #[must_use]
    pub fn percentage(&self) -> u8 {
        let total = self.total_bytes + self.total_items;
        if total == 0 {
            return 0;
        }
        let done = (self.current_bytes + self.current_items).min(total);
        u8::try_from(done * 100 / total).unwrap_or(100)
    }
}

/// Bridges fetch queue callbacks into job events
#[derive(Debug)]
pub struct AcquireStatus {
    progress: PhaseProgress,
    cancel: CancelToken,
    last_speed: u64,
}

impl AcquireStatus {
    #[must_use]
    pub fn new(sender: Option<EventSender>, cancel: CancelToken) -> Self {
        Self {
            progress: PhaseProgress::new(sender),
            cancel,
            last_speed: 0,
        }
    }

    /// Enter the download phase
    pub fn start(&mut self) {
        self.progress.set_status(Status::Download);
    }

    pub fn fetch(&mut self, item: &FetchItem) {
        tracing::debug!(uri = %item.uri, size = item.size, "fetching archive");
        self.emit_item_progress(&item.package_id, Status::Download, 0);
    }

    pub fn done(&mut self, item: &FetchItem) {
        self.emit_item_progress(&item.package_id, Status::Finished, 100);
    }

    pub fn fail(&mut self, item: &FetchItem, reason: &str) {
        tracing::warn!(uri = %item.uri, reason, "archive fetch failed");
        self.emit_warning(format!("{}: {reason}", item.description));
    }

    /// Report a progress sample. Returns false when the job was cancelled
    /// and the queue should stop.
    pub fn pulse(&mut self, pulse: &FetchPulse) -> bool {
        self.progress.set_percentage(pulse.percentage());

        if pulse.bytes_per_second != self.last_speed {
            self.last_speed = pulse.bytes_per_second;
            self.emit_speed(pulse.bytes_per_second);
        }

        !self.cancel.is_cancelled()
    }
}

impl EventEmitter for AcquireStatus {
    fn event_sender(&self) -> Option<&EventSender> {
        self.progress.event_sender()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgjob_events::{AppEvent, ProgressEvent};

    #[test]
    fn test_percentage_counts_items() {
        let pulse = FetchPulse {
            current_bytes: 0,
            current_items: 1,
            total_bytes: 0,
            total_items: 4,
            bytes_per_second: 0,
        };
        assert_eq!(pulse.percentage(), 25);
        assert_eq!(FetchPulse::default().percentage(), 0);
    }

    #[test]
    fn test_pulse_only_reports_changes() {
        let (tx, mut rx) = pkgjob_events::channel();
        let cancel = CancelToken::new(None);
        let mut status = AcquireStatus::new(Some(tx), cancel.clone());

        let mut pulse = FetchPulse {
            total_bytes: 100,
            total_items: 0,
            current_bytes: 50,
            bytes_per_second: 10,
            ..FetchPulse::default()
        };
        assert!(status.pulse(&pulse));
        // Same sample again: nothing new to say
        assert!(status.pulse(&pulse));
        pulse.current_bytes = 40;
        assert!(status.pulse(&pulse));

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(
            events.as_slice(),
            [
                AppEvent::Progress(ProgressEvent::Percentage { value: Some(50) }),
                AppEvent::Progress(ProgressEvent::Speed { bytes_per_second: 10 }),
            ]
        ));

        cancel.cancel();
        assert!(!status.pulse(&pulse));
    }
}
