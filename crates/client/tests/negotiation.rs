mod common;

use tonic::Status;

use common::{Attempt, MockConnector, test_credentials};
use stt_client::candidates::{RECOGNIZER_V1, RECOGNIZER_V2, default_endpoints};
use stt_client::negotiator::negotiate;
use stt_client::{SpeechError, StreamConfig};

#[tokio::test]
async fn first_working_combination_wins() {
    let connector = MockConnector::new(vec![Attempt::Accept(vec![])]);
    let result = negotiate(
        &connector,
        &test_credentials(),
        &default_endpoints(),
        &StreamConfig::default(),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(
        connector.attempts(),
        vec![("gateway-key-pair", RECOGNIZER_V1.to_string())]
    );
}

#[tokio::test]
async fn unimplemented_method_advances_the_endpoint_only() {
    let connector = MockConnector::new(vec![
        Attempt::Reject(Status::unimplemented("no such method")),
        Attempt::Accept(vec![]),
    ]);
    let result = negotiate(
        &connector,
        &test_credentials(),
        &default_endpoints(),
        &StreamConfig::default(),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(
        connector.attempts(),
        vec![
            ("gateway-key-pair", RECOGNIZER_V1.to_string()),
            ("gateway-key-pair", RECOGNIZER_V2.to_string()),
        ]
    );
}

#[tokio::test]
async fn rejected_credential_skips_its_remaining_endpoints() {
    let connector = MockConnector::new(vec![
        Attempt::Reject(Status::unauthenticated("bad key")),
        Attempt::Accept(vec![]),
    ]);
    let result = negotiate(
        &connector,
        &test_credentials(),
        &default_endpoints(),
        &StreamConfig::default(),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(
        connector.attempts(),
        vec![
            ("gateway-key-pair", RECOGNIZER_V1.to_string()),
            ("secret-key", RECOGNIZER_V1.to_string()),
        ]
    );
}

#[tokio::test]
async fn internal_status_counts_as_a_credential_rejection() {
    let connector = MockConnector::new(vec![
        Attempt::Reject(Status::internal("header mismatch")),
        Attempt::Accept(vec![]),
    ]);
    let result = negotiate(
        &connector,
        &test_credentials(),
        &default_endpoints(),
        &StreamConfig::default(),
    )
    .await;

    assert!(result.is_ok());
    let attempts = connector.attempts();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[1].0, "secret-key");
}

#[tokio::test]
async fn fatal_status_stops_negotiation_immediately() {
    let connector = MockConnector::new(vec![Attempt::Reject(Status::resource_exhausted("quota"))]);
    let err = negotiate(
        &connector,
        &test_credentials(),
        &default_endpoints(),
        &StreamConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SpeechError::Fatal(_)));
    assert_eq!(connector.attempts().len(), 1);
}

#[tokio::test]
async fn exhausting_every_candidate_reports_the_last_cause() {
    // Credential-class rejections, so each credential burns one attempt.
    let connector = MockConnector::new(vec![
        Attempt::Reject(Status::unauthenticated("bad pair")),
        Attempt::Reject(Status::permission_denied("bad secret")),
    ]);
    let err = negotiate(
        &connector,
        &test_credentials(),
        &default_endpoints(),
        &StreamConfig::default(),
    )
    .await
    .unwrap_err();

    match err {
        SpeechError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 2);
            assert!(last.to_string().contains("bad secret"));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_credentials_fail_before_any_attempt() {
    let connector = MockConnector::new(vec![]);
    let err = negotiate(
        &connector,
        &[],
        &default_endpoints(),
        &StreamConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SpeechError::NoCredentials));
    assert!(connector.attempts().is_empty());
}
