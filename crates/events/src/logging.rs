//! Structured logging integration for events
//!
//! Consumers of the event channel can route every event into `tracing`
//! with the source, event id and correlation id attached as fields.

use crate::{AppEvent, EventMessage, EventReceiver, GeneralEvent, JobEvent, PackageEvent, ProgressEvent};
use tracing::{debug, error, info, warn};

/// Log an event at its own level with structured fields
pub fn log_event(message: &EventMessage) {
    let event = &message.event;
    let meta = &message.meta;

    match event {
        AppEvent::General(GeneralEvent::Warning { message }) => {
            warn!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                "{message}"
            );
        }
        AppEvent::General(GeneralEvent::Error { message }) => {
            error!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                "{message}"
            );
        }
        AppEvent::Job(JobEvent::ErrorCode { failure }) => {
            error!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                code = ?failure.code,
                retryable = failure.retryable,
                hint = ?failure.hint,
                "{}",
                failure.message
            );
        }
        AppEvent::Job(JobEvent::RequireRestart { kind, package_id }) => {
            info!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                restart = ?kind,
                package_id = %package_id,
                "Restart required"
            );
        }
        AppEvent::Progress(ProgressEvent::StatusChanged { status }) => {
            info!(
                source = meta.source.as_str(),
                correlation = ?meta.correlation_id,
                status = ?status,
                "Status changed"
            );
        }
        AppEvent::Package(PackageEvent::Emitted {
            info,
            package_id,
            ..
        }) => {
            debug!(
                source = meta.source.as_str(),
                correlation = ?meta.correlation_id,
                info = ?info,
                package_id = %package_id,
                "Package"
            );
        }
        other => {
            debug!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                target = other.log_target(),
                event = ?other,
                "Event"
            );
        }
    }
}

/// Drain a receiver into tracing until every sender is gone.
/// Returns the number of events logged.
pub async fn forward_to_tracing(mut receiver: EventReceiver, correlation_id: Option<String>) -> usize {
    let mut count = 0;
    while let Some(event) = receiver.recv().await {
        let mut message = EventMessage::from_event(event);
        if let Some(id) = &correlation_id {
            message.meta = message.meta.with_correlation_id(id.clone());
        }
        log_event(&message);
        count += 1;
    }
    count
}
