use std::{sync::Arc, thread};

use gubbins::prelude::*;
use gubbins::Failure;

#[test]
fn concurrent_requests_to_distinct_urls_are_all_answered() {
    // Arrange
    let server = MockServer::start();
    for i in 0..20 {
        server.expect(&format!("/items/{}", i), [resp_body(i.to_string())]);
    }

    // Act
    let bodies: Vec<(usize, String)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..20)
            .map(|i| {
                let server = &server;
                scope.spawn(move || {
                    let body = server
                        .blocking_client()
                        .get(server.url(format!("/items/{}", i)))
                        .send()
                        .unwrap()
                        .text()
                        .unwrap();
                    (i, body)
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Assert
    for (i, body) in bodies {
        assert_eq!(body, i.to_string());
    }
    server.finish();
}

#[test]
fn concurrent_requests_never_share_an_expectation() {
    // Arrange
    let recorder = Arc::new(Recorder::new());
    let server = MockServer::start_with_reporter(recorder.clone());
    for i in 0..5 {
        server.expect("/shared", [resp_body(i.to_string())]);
    }

    // Act
    let responses: Vec<(u16, String)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let server = &server;
                scope.spawn(move || {
                    let response = server
                        .blocking_client()
                        .get(server.url("/shared"))
                        .send()
                        .unwrap();
                    let status = response.status().as_u16();
                    (status, response.text().unwrap())
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    server.finish();

    // Assert
    let mut served: Vec<String> = responses
        .iter()
        .filter(|(status, _)| *status == 200)
        .map(|(_, body)| body.clone())
        .collect();
    served.sort();

    assert_eq!(served, vec!["0", "1", "2", "3", "4"]);
    assert_eq!(responses.iter().filter(|(s, _)| *s == 404).count(), 5);
    assert_eq!(
        recorder.failures(),
        vec![
            Failure::UnexpectedRequest {
                url: server.url("/shared")
            };
            5
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_async_requests_are_all_answered() {
    let server = MockServer::start();
    for i in 0..10 {
        server.expect(&format!("/async/{}", i), [status(200 + i)]);
    }

    let client = server.client();
    let requests = (0..10u16).map(|i| {
        let client = client.clone();
        let url = server.url(format!("/async/{}", i));
        tokio::spawn(async move { (i, client.get(url).send().await.unwrap().status()) })
    });

    for request in requests.collect::<Vec<_>>() {
        let (i, status) = request.await.unwrap();
        assert_eq!(status.as_u16(), 200 + i);
    }

    server.finish();
}
