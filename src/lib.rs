//! `gubbins` contains small helpers for writing tests against HTTP dependencies. Its main
//! component is a **mock server**: a real HTTP listener that answers requests from a list of
//! registered expectations and verifies at the end of a test that every required expectation
//! was called exactly once.
//!
//! # Getting Started
//! ```rust
//! use gubbins::prelude::*;
//! use serde_json::json;
//!
//! // Start a lightweight mock server.
//! let server = MockServer::start();
//!
//! // Register an expectation. Requests must match the URL exactly, query string included.
//! server.expect(
//!     "/widgets",
//!     [method("GET"), status(200), resp_json(&json!({"id": 1}))],
//! );
//!
//! // Send an HTTP request to the mock server. This simulates your code.
//! let response = server
//!     .blocking_client()
//!     .get(server.url("/widgets"))
//!     .send()
//!     .unwrap();
//!
//! assert_eq!(response.status(), 200);
//! assert_eq!(response.text().unwrap(), "{\"id\":1}");
//!
//! // Ensure every required expectation received its request.
//! server.finish();
//! ```
//!
//! # Matching
//! Every incoming request is compared against the registered expectations in registration
//! order. The first expectation that has not been called yet and whose URL equals the request
//! URL wins and is marked as called, so each expectation answers at most one request. A
//! request that matches nothing receives an empty `404 Not Found`.
//!
//! Method and body constraints are checked only after the URL matched. A violation is
//! reported, but the configured response is still sent and the expectation is still used up.
//!
//! # Reporting
//! Problems are passed to a [Reporter]. Mismatches such as a wrong method, a wrong body, an
//! unexpected request or a missing request are non-fatal [Failure]s: the server keeps serving
//! so that one test run shows all of them. Malformed fixtures and transport faults are fatal
//! [Error]s.
//!
//! [MockServer::start] uses a [TestReporter], which panics on fatal errors right away and
//! panics with every collected failure when [MockServer::finish] is called. Failures that were
//! never passed to `finish` make the server panic when it is dropped. Use a [Recorder]
//! with [MockServer::start_with_reporter] to inspect failures instead.
//!
//! # Debugging
//! `gubbins` logs through the `tracing` crate. Without a subscriber, events are forwarded to
//! the `log` crate, so a logger like `env_logger` shows them when `RUST_LOG` is set:
//! ```rust
//! #[test]
//! fn your_test() {
//!     let _ = env_logger::try_init();
//!     // ...
//! }
//! ```
pub mod assert;
pub mod report;

mod api;
mod common;
mod server;

pub use api::{
    method, optional, req_body, req_json, resp_body, resp_json, status, ExpectOption, MockServer,
};
pub use report::{Error, Failure, Recorder, Reporter, TestReporter};
pub use server::MockServerConfig;

pub mod prelude {
    #[doc(no_inline)]
    pub use crate::{
        method, optional, req_body, req_json, resp_body, resp_json, status, ExpectOption,
        MockServer, MockServerConfig, Recorder, Reporter, TestReporter,
    };
}
