use crate::core::error::{display_body_for_error, SdkError, TransportError};

#[test]
fn unsupported_message_names_the_kind() {
    let err = SdkError::unsupported_message("tool");
    assert_eq!(err.to_string(), "unsupported message type: tool");
}

#[test]
fn status_is_reported_for_http_errors() {
    assert_eq!(SdkError::Unauthorized.status(), Some(401));
    assert_eq!(
        SdkError::Upstream {
            status: 502,
            message: "bad gateway".into(),
            source: None,
        }
        .status(),
        Some(502)
    );
    assert_eq!(
        SdkError::RateLimited {
            retry_after_ms: None,
            source: None
        }
        .status(),
        Some(429)
    );
    assert_eq!(SdkError::Timeout.status(), None);
}

#[test]
fn transport_timeouts_are_flagged() {
    assert!(TransportError::IdleReadTimeout(std::time::Duration::from_secs(1)).is_timeout());
    assert!(!TransportError::Network("x".into()).is_timeout());
}

#[test]
fn error_bodies_are_summarized() {
    assert_eq!(
        display_body_for_error("{ \"error\": { \"message\": \"nope\" } }"),
        r#"{"error":{"message":"nope"}}"#
    );
    assert_eq!(display_body_for_error("<html>gateway</html>"), "20 bytes");
}
