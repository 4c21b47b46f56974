//! Integration tests for events

#[cfg(test)]
mod tests {
    use pkgjob_errors::{Error, ResolverError};
    use pkgjob_events::*;
    use pkgjob_types::InfoKind;

    #[tokio::test]
    async fn test_event_sender_ext() {
        let (tx, mut rx) = channel();

        tx.emit_error("test error");
        tx.emit_debug("test debug");

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(event1, AppEvent::General(GeneralEvent::Error { .. })));

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(event2, AppEvent::General(GeneralEvent::DebugLog { .. })));

        match (event1, event2) {
            (AppEvent::General(error), AppEvent::General(debug)) => {
                assert_eq!(error.message(), "test error");
                assert_eq!(debug.message(), "test debug");
            }
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_warning("ignored");
        tx.emit_status(Status::Finished);
    }

    #[tokio::test]
    async fn test_failure_event_carries_code() {
        let (tx, mut rx) = channel();
        let err: Error = ResolverError::NoCandidate {
            package: "awk".into(),
        }
        .into();
        tx.emit_failure(&err);

        match rx.recv().await.unwrap() {
            AppEvent::Job(JobEvent::ErrorCode { failure }) => {
                assert_eq!(failure.code.as_deref(), Some("dep-resolution-failed"));
                assert_eq!(
                    failure.message,
                    "Package awk is virtual and has no installation candidate"
                );
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_event_serialization() {
        let event = AppEvent::Package(PackageEvent::Emitted {
            info: InfoKind::Installing,
            package_id: "hello;2.10-3;amd64;debian-bookworm-main".into(),
            summary: "example package".into(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "package");
        assert_eq!(json["event"]["type"], "emitted");
        assert_eq!(json["event"]["info"], "installing");
    }

    #[test]
    fn test_log_levels() {
        let warn = AppEvent::General(GeneralEvent::warning("careful"));
        assert_eq!(warn.log_level(), tracing::Level::WARN);
        let pct = AppEvent::Progress(ProgressEvent::Percentage { value: Some(4) });
        assert_eq!(pct.log_level(), tracing::Level::DEBUG);
        assert_eq!(pct.event_source(), EventSource::Progress);
        let message = EventMessage::from_event(pct);
        assert_eq!(message.meta.level, EventLevel::Debug);
    }

    #[tokio::test]
    async fn test_forward_to_tracing_counts() {
        let (tx, rx) = channel();
        tx.emit_status(Status::Query);
        tx.emit_package(InfoKind::Available, "a;1;all;", "");
        drop(tx);
        let logged = logging::forward_to_tracing(rx, Some("job-1".into())).await;
        assert_eq!(logged, 2);
    }
}
