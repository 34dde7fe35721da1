use std::sync::Arc;

use gubbins::prelude::*;
use gubbins::Failure;
use serde_json::json;

#[test]
fn uncalled_expectation_is_reported() {
    // Arrange
    let recorder = Arc::new(Recorder::new());
    let server = MockServer::start_with_reporter(recorder.clone());
    server.expect(
        "/widgets",
        [method("GET"), status(200), resp_json(&json!({"id": 1}))],
    );

    // Act
    server.finish();

    // Assert
    assert_eq!(
        recorder.failures(),
        vec![Failure::MissingRequest {
            url: server.url("/widgets")
        }]
    );
}

#[test]
fn optional_expectation_is_not_reported() {
    let recorder = Arc::new(Recorder::new());
    let server = MockServer::start_with_reporter(recorder.clone());
    server.expect("/widgets", [optional()]);

    server.finish();

    assert!(!recorder.is_failed());
}

#[test]
fn first_of_two_expectations_for_same_url_is_used() {
    // Arrange
    let recorder = Arc::new(Recorder::new());
    let server = MockServer::start_with_reporter(recorder.clone());
    server.expect("/y", [status(201)]);
    server.expect("/y", [status(202), optional()]);

    // Act
    let response = server.blocking_client().get(server.url("/y")).send().unwrap();
    server.finish();

    // Assert
    assert_eq!(response.status(), 201);
    assert!(!recorder.is_failed());
}

#[test]
fn second_required_expectation_for_same_url_is_reported_missing() {
    // Arrange
    let recorder = Arc::new(Recorder::new());
    let server = MockServer::start_with_reporter(recorder.clone());
    server.expect("/y", [status(201)]);
    server.expect("/y", [status(202)]);

    // Act
    let response = server.blocking_client().get(server.url("/y")).send().unwrap();
    server.finish();

    // Assert
    assert_eq!(response.status(), 201);
    assert_eq!(
        recorder.failures(),
        vec![Failure::MissingRequest {
            url: server.url("/y")
        }]
    );
}

#[test]
fn missing_requests_are_reported_in_registration_order() {
    let recorder = Arc::new(Recorder::new());
    let server = MockServer::start_with_reporter(recorder.clone());
    server.expect("/c", [method("GET")]);
    server.expect("/a", [method("GET")]);
    server.expect("/b", [optional()]);

    server.finish();

    assert_eq!(
        recorder.failures(),
        vec![
            Failure::MissingRequest {
                url: server.url("/c")
            },
            Failure::MissingRequest {
                url: server.url("/a")
            },
        ]
    );
}

#[test]
fn finish_does_not_reset_expectations() {
    let recorder = Arc::new(Recorder::new());
    let server = MockServer::start_with_reporter(recorder.clone());
    server.expect("/widgets", [status(204)]);

    server.finish();
    server.finish();

    assert_eq!(recorder.failures().len(), 2);
}

#[test]
#[should_panic(expected = "no request for")]
fn default_reporter_fails_test_on_finish() {
    let server = MockServer::start();
    server.expect("/widgets", [method("GET")]);

    server.finish();
}

#[test]
fn default_reporter_passes_when_everything_was_called() {
    let server = MockServer::start();
    server.expect("/widgets", [method("GET")]);
    server.expect("/gadgets", [optional()]);

    let response = server
        .blocking_client()
        .get(server.url("/widgets"))
        .send()
        .unwrap();

    assert_eq!(response.status(), 200);
    server.finish();
}

#[test]
#[should_panic(expected = "method mismatch")]
fn default_reporter_fails_test_when_server_is_dropped_without_finish() {
    let server = MockServer::start();
    server.expect("/widgets", [method("POST")]);
    let client = server.blocking_client();

    let matched = client.get(server.url("/widgets")).send().unwrap();
    let unmatched = client.get(server.url("/unregistered")).send().unwrap();

    assert_eq!(matched.status(), 200);
    assert_eq!(unmatched.status(), 404);
    drop(server);
}

#[test]
fn dropping_server_after_clean_finish_does_not_panic() {
    let server = MockServer::start();
    server.expect("/widgets", [method("GET")]);

    server.blocking_client().get(server.url("/widgets")).send().unwrap();
    server.finish();

    drop(server);
}
