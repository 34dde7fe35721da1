use std::sync::Arc;

use gubbins::prelude::*;
use gubbins::Failure;

#[test]
fn unregistered_url_gets_not_found() {
    // Arrange
    let recorder = Arc::new(Recorder::new());
    let server = MockServer::start_with_reporter(recorder.clone());

    // Act
    let response = server
        .blocking_client()
        .get(server.url("/unregistered"))
        .send()
        .unwrap();

    // Assert
    assert_eq!(response.status(), 404);
    assert_eq!(response.text().unwrap(), "");
    assert_eq!(
        recorder.failures(),
        vec![Failure::UnexpectedRequest {
            url: server.url("/unregistered")
        }]
    );
}

#[test]
fn query_string_must_match_exactly() {
    // Arrange
    let recorder = Arc::new(Recorder::new());
    let server = MockServer::start_with_reporter(recorder.clone());
    server.expect("/search?query=metallica", [status(204)]);
    let client = server.blocking_client();

    // Act
    let other_query = client
        .get(server.url("/search?query=megadeth"))
        .send()
        .unwrap();
    let no_query = client.get(server.url("/search")).send().unwrap();
    let exact = client
        .get(server.url("/search?query=metallica"))
        .send()
        .unwrap();
    server.finish();

    // Assert
    assert_eq!(other_query.status(), 404);
    assert_eq!(no_query.status(), 404);
    assert_eq!(exact.status(), 204);
    assert_eq!(recorder.failures().len(), 2);
}

#[test]
fn path_is_not_matched_by_prefix() {
    let recorder = Arc::new(Recorder::new());
    let server = MockServer::start_with_reporter(recorder.clone());
    server.expect("/widgets", [optional()]);

    let response = server
        .blocking_client()
        .get(server.url("/widgets/1"))
        .send()
        .unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(
        recorder.failures(),
        vec![Failure::UnexpectedRequest {
            url: server.url("/widgets/1")
        }]
    );
}

#[test]
fn expectation_answers_only_one_request() {
    // Arrange
    let recorder = Arc::new(Recorder::new());
    let server = MockServer::start_with_reporter(recorder.clone());
    server.expect("/once", [status(202)]);
    let client = server.blocking_client();

    // Act
    let first = client.get(server.url("/once")).send().unwrap();
    let second = client.get(server.url("/once")).send().unwrap();
    server.finish();

    // Assert
    assert_eq!(first.status(), 202);
    assert_eq!(second.status(), 404);
    assert_eq!(
        recorder.failures(),
        vec![Failure::UnexpectedRequest {
            url: server.url("/once")
        }]
    );
}

#[test]
fn absolute_url_can_be_registered() {
    let server = MockServer::start();
    server.expect(&server.url("/absolute?x=1"), [status(200)]);

    let response = server
        .blocking_client()
        .get(server.url("/absolute?x=1"))
        .send()
        .unwrap();

    assert_eq!(response.status(), 200);
    server.finish();
}

#[test]
fn expectations_for_different_urls_match_independently_of_order() {
    let server = MockServer::start();
    server.expect("/first", [resp_body("one")]);
    server.expect("/second", [resp_body("two")]);
    let client = server.blocking_client();

    let second = client.get(server.url("/second")).send().unwrap();
    let first = client.get(server.url("/first")).send().unwrap();

    assert_eq!(second.text().unwrap(), "two");
    assert_eq!(first.text().unwrap(), "one");
    server.finish();
}
