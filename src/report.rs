//! The boundary through which the mock server and the assertion helpers report problems.
//!
//! There are two severities. A [Failure] is a non-fatal mismatch: it is recorded, the test is
//! considered failed, but request processing carries on so that a single run can surface
//! several independent problems. An [Error] is fatal: it signals a malformed fixture or a
//! broken transport and the test cannot meaningfully continue.
use std::{
    fmt,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, PoisonError,
    },
    thread,
};

use thiserror::Error;

use crate::assert::diff;

/// Fatal conditions.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot parse URL {0:?}: {1}")]
    InvalidUrl(String, url::ParseError),
    #[error("invalid status code: {0}")]
    InvalidStatus(u16),
    #[error("cannot create response: {0}")]
    Response(#[from] http::Error),
    #[error("cannot serve connection: {0}")]
    Connection(#[from] hyper::Error),
    #[error("cannot bind to socket addr {0}: {1}")]
    Bind(SocketAddr, std::io::Error),
    #[error("cannot access fixture {}: {}", .0.display(), .1)]
    Fixture(PathBuf, std::io::Error),
    #[error("cannot start mock server: {0}")]
    Startup(String),
}

/// Non-fatal conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// A compared value differed from what was expected.
    Mismatch {
        name: String,
        want: String,
        got: String,
    },
    /// The mock server received a request no expectation was registered for.
    UnexpectedRequest { url: String },
    /// A required expectation never received a request.
    MissingRequest { url: String },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Mismatch { name, want, got } => {
                write!(f, "{} mismatch (-want +got):\n{}", name, diff(want, got))
            }
            Failure::UnexpectedRequest { url } => write!(f, "unexpected request for {:?}", url),
            Failure::MissingRequest { url } => write!(f, "no request for {:?}", url),
        }
    }
}

/// Receives failures and errors on behalf of the running test.
///
/// Implementations must be callable from the mock server's background thread.
pub trait Reporter: Send + Sync {
    /// Records a non-fatal failure. Must not halt execution.
    fn report(&self, failure: Failure);

    /// Records a fatal error.
    fn fail(&self, error: Error);

    /// Called once by [MockServer::finish](crate::MockServer::finish) after every missing
    /// request has been reported.
    fn conclude(&self) {}
}

/// A [Reporter] that collects everything it receives and never panics.
///
/// Useful when a test wants to make assertions about the failures themselves.
#[derive(Debug, Default)]
pub struct Recorder {
    failures: Mutex<Vec<Failure>>,
    errors: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All non-fatal failures in the order they were reported.
    pub fn failures(&self) -> Vec<Failure> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The messages of all fatal errors in the order they were reported.
    pub fn errors(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_failed(&self) -> bool {
        !self.failures().is_empty() || !self.errors().is_empty()
    }

    fn summary(&self) -> Option<String> {
        let failures = self.failures();
        let errors = self.errors();
        if failures.is_empty() && errors.is_empty() {
            return None;
        }

        let mut output = format!(
            "{} failure(s) and {} fatal error(s) were reported:\n",
            failures.len(),
            errors.len()
        );
        for error in errors {
            output.push_str(&format!("\n{}\n", error));
        }
        for failure in failures {
            output.push_str(&format!("\n{}\n", failure));
        }

        Some(output)
    }
}

impl Reporter for Recorder {
    fn report(&self, failure: Failure) {
        tracing::warn!("{}", failure);
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failure);
    }

    fn fail(&self, error: Error) {
        tracing::error!("{}", error);
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.to_string());
    }
}

/// The [Reporter] used by [MockServer::start](crate::MockServer::start).
///
/// Fatal errors panic right away. Non-fatal failures are collected and turned into a single
/// panic when the mock server is finished, which fails the calling test.
///
/// Failures that were never concluded still fail the test: dropping the reporter panics with
/// them, unless the thread is already unwinding.
#[derive(Debug, Default)]
pub struct TestReporter {
    recorder: Recorder,
    concluded: AtomicUsize,
}

impl TestReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    fn reported(&self) -> usize {
        self.recorder.failures().len() + self.recorder.errors().len()
    }
}

impl Reporter for TestReporter {
    fn report(&self, failure: Failure) {
        self.recorder.report(failure);
    }

    fn fail(&self, error: Error) {
        let message = error.to_string();
        self.recorder.fail(error);
        panic!("{}", message);
    }

    fn conclude(&self) {
        self.concluded.store(self.reported(), Ordering::SeqCst);
        if let Some(summary) = self.recorder.summary() {
            panic!("{}", summary);
        }
    }
}

impl Drop for TestReporter {
    fn drop(&mut self) {
        if thread::panicking() || self.reported() <= self.concluded.load(Ordering::SeqCst) {
            return;
        }

        if let Some(summary) = self.recorder.summary() {
            panic!("mock server was dropped without finish: {}", summary);
        }
    }
}
