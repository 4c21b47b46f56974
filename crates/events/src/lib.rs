#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for the pkgjob transaction engine
//!
//! Every observable effect of a job (status changes, percentages, emitted
//! packages, terminal errors) travels through an unbounded channel of
//! [`AppEvent`]s. Emission never fails: a dropped receiver is ignored.
//!
//! ## Architecture
//!
//! - **Domain events**: grouped as general, progress, package and job events
//! - **Unified `EventEmitter` trait**: one API for raw senders and for
//!   structs that carry one
//! - **Tracing integration**: events know their log level and target, and
//!   [`logging::forward_to_tracing`] drains a receiver into `tracing`

pub mod logging;
pub mod meta;
pub use meta::{EventLevel, EventMessage, EventMeta, EventSource};

pub mod progress;
pub use progress::PhaseProgress;

pub mod events;
pub use events::{
    AppEvent, FailureContext, GeneralEvent, JobEvent, PackageDetails, PackageEvent,
    ProgressEvent, Status, UpdateDetail,
};

use pkgjob_errors::UserFacingError;
use pkgjob_types::{InfoKind, RestartKind};
use tokio::sync::mpsc::UnboundedSender;

/// Type alias for event sender using the `AppEvent` system
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for event receiver using the `AppEvent` system
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel with the `AppEvent` system
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout the engine
///
/// This trait provides a single, consistent API for emitting events regardless of
/// whether you have a raw `EventSender` or a struct that contains one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(event);
        }
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    /// Emit an error event
    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    /// Emit a status change without phase tracking
    fn emit_status(&self, status: Status) {
        self.emit(AppEvent::Progress(ProgressEvent::StatusChanged { status }));
    }

    /// Emit an overall percentage, `None` for unknown
    fn emit_percentage(&self, value: Option<u8>) {
        self.emit(AppEvent::Progress(ProgressEvent::Percentage { value }));
    }

    fn emit_allow_cancel(&self, allowed: bool) {
        self.emit(AppEvent::Progress(ProgressEvent::AllowCancel { allowed }));
    }

    fn emit_item_progress(&self, package_id: impl Into<String>, status: Status, percentage: u8) {
        self.emit(AppEvent::Progress(ProgressEvent::ItemProgress {
            package_id: package_id.into(),
            status,
            percentage,
        }));
    }

    fn emit_download_size_remaining(&self, bytes: u64) {
        self.emit(AppEvent::Progress(ProgressEvent::DownloadSizeRemaining { bytes }));
    }

    fn emit_speed(&self, bytes_per_second: u64) {
        self.emit(AppEvent::Progress(ProgressEvent::Speed { bytes_per_second }));
    }

    /// Emit one package of a result list
    fn emit_package(&self, info: InfoKind, package_id: impl Into<String>, summary: impl Into<String>) {
        self.emit(AppEvent::Package(PackageEvent::Emitted {
            info,
            package_id: package_id.into(),
            summary: summary.into(),
        }));
    }

    fn emit_require_restart(&self, kind: RestartKind, package_id: impl Into<String>) {
        self.emit(AppEvent::Job(JobEvent::RequireRestart {
            kind,
            package_id: package_id.into(),
        }));
    }

    /// Emit the terminal error event for a failure
    fn emit_failure<E: UserFacingError + ?Sized>(&self, error: &E) {
        self.emit(AppEvent::Job(JobEvent::ErrorCode {
            failure: FailureContext::from_error(error),
        }));
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}
