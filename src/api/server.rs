use std::{
    net::SocketAddr,
    sync::Arc,
    thread::{self, JoinHandle},
};

use tokio::sync::oneshot;
use url::Url;

use crate::{
    api::options::ExpectOption,
    common::{data::Expectation, runtime, util::Join},
    report::{Error, Failure, Reporter, TestReporter},
    server::{self, ExpectationHandler, ExpectationRegistry, HttpServer, MockServerConfig},
};

/// A mock server that answers real HTTP requests from a list of registered expectations.
///
/// The server listens on its own background thread and stops when the value is dropped.
/// Call [finish](MockServer::finish) at the end of every test, otherwise expectations that
/// were never called go unnoticed.
pub struct MockServer {
    registry: Arc<ExpectationRegistry>,
    reporter: Arc<dyn Reporter>,
    address: SocketAddr,
    base_url: Url,
    client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<Result<(), server::Error>>>,
}

impl MockServer {
    /// Starts a new `MockServer` on a free local port. Failures are reported to a
    /// [TestReporter], so any mismatch makes [finish](MockServer::finish) panic.
    ///
    /// **Example**:
    /// ```
    /// use gubbins::{method, MockServer};
    ///
    /// let server = MockServer::start();
    /// server.expect("/hello", [method("GET")]);
    ///
    /// let response = server
    ///     .blocking_client()
    ///     .get(server.url("/hello"))
    ///     .send()
    ///     .unwrap();
    ///
    /// assert_eq!(response.status(), 200);
    /// server.finish();
    /// ```
    pub fn start() -> Self {
        Self::start_with_reporter(Arc::new(TestReporter::new()))
    }

    /// Starts a new `MockServer` on a free local port that reports to `reporter`.
    pub fn start_with_reporter(reporter: Arc<dyn Reporter>) -> Self {
        Self::start_with_config(MockServerConfig::default(), reporter)
    }

    /// Starts a new `MockServer` with the given listener settings.
    ///
    /// A server that cannot be started is a fatal error: it is passed to `reporter` and this
    /// method panics afterwards.
    pub fn start_with_config(config: MockServerConfig, reporter: Arc<dyn Reporter>) -> Self {
        match Self::try_start(config, reporter.clone()) {
            Ok(server) => server,
            Err(err) => {
                let message = err.to_string();
                reporter.fail(err);
                panic!("Cannot start mock server: {}", message);
            }
        }
    }

    fn try_start(config: MockServerConfig, reporter: Arc<dyn Reporter>) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|err| Error::Startup(format!("cannot build HTTP client: {}", err)))?;

        let registry = Arc::new(ExpectationRegistry::new());
        let handler = ExpectationHandler::new(registry.clone(), reporter.clone());
        let http_server = HttpServer::new(handler, config, reporter.clone());

        let (addr_sender, addr_receiver) = oneshot::channel::<SocketAddr>();
        let (shutdown_sender, shutdown_receiver) = oneshot::channel::<()>();

        let join_handle = thread::spawn(move || {
            let shutdown = async {
                let _ = shutdown_receiver.await;
            };
            let srv = http_server.start_with_signals(Some(addr_sender), shutdown);

            runtime::block_on_current_thread(srv).map_err(server::Error::RuntimeError)?
        });

        let address = match addr_receiver.join() {
            Ok(address) => address,
            Err(_) => {
                return Err(match join_handle.join() {
                    Ok(Err(err)) => err.into(),
                    _ => Error::Startup("server thread exited before listening".to_string()),
                });
            }
        };

        let base_url = Url::parse(&format!("http://127.0.0.1:{}", address.port()))
            .map_err(|err| Error::Startup(format!("cannot build base URL: {}", err)))?;

        Ok(MockServer {
            registry,
            reporter,
            address,
            base_url,
            client,
            shutdown: Some(shutdown_sender),
            join_handle: Some(join_handle),
        })
    }

    /// The hostname clients should use to reach the server. Always `127.0.0.1`.
    pub fn host(&self) -> String {
        "127.0.0.1".to_string()
    }

    /// The TCP port that the mock server is listening on.
    pub fn port(&self) -> u16 {
        self.address.port()
    }

    /// The socket address the listener is bound to.
    pub fn address(&self) -> &SocketAddr {
        &self.address
    }

    /// Builds the URL for a specific path on the mock server.
    ///
    /// **Example**:
    /// ```
    /// let server = gubbins::MockServer::start();
    ///
    /// let expected_url = format!("http://127.0.0.1:{}/hello", server.port());
    ///
    /// assert_eq!(expected_url, server.url("/hello"));
    /// ```
    pub fn url<S: Into<String>>(&self, path: S) -> String {
        format!("http://{}:{}{}", self.host(), self.port(), path.into())
    }

    /// The base URL of the mock server, e.g. `http://127.0.0.1:41234`.
    pub fn base_url(&self) -> String {
        self.url("")
    }

    /// An async HTTP client set up to reach this server directly, bypassing any proxy
    /// configured in the environment.
    pub fn client(&self) -> reqwest::Client {
        self.client.clone()
    }

    /// A blocking HTTP client set up like [client](MockServer::client).
    ///
    /// Must not be called from within an async runtime.
    pub fn blocking_client(&self) -> reqwest::blocking::Client {
        reqwest::blocking::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_else(|err| panic!("Cannot build blocking HTTP client: {}", err))
    }

    /// Registers an expectation for requests to `url`.
    ///
    /// `url` is either absolute or relative to [base_url](MockServer::base_url). A request
    /// matches if its full URL, including the query string, is equal. Each expectation
    /// answers at most one request; expectations for the same URL are used in the order they
    /// were registered.
    ///
    /// A `url` that cannot be parsed is a fatal error and nothing is registered.
    ///
    /// **Example**:
    /// ```
    /// use gubbins::{method, resp_json, status, MockServer};
    /// use serde_json::json;
    ///
    /// let server = MockServer::start();
    /// server.expect(
    ///     "/widgets",
    ///     [method("GET"), status(200), resp_json(&json!({"id": 1}))],
    /// );
    ///
    /// let body = server
    ///     .blocking_client()
    ///     .get(server.url("/widgets"))
    ///     .send()
    ///     .unwrap()
    ///     .text()
    ///     .unwrap();
    ///
    /// assert_eq!(body, "{\"id\":1}");
    /// server.finish();
    /// ```
    pub fn expect<I>(&self, url: &str, options: I)
    where
        I: IntoIterator<Item = ExpectOption>,
    {
        let parsed = match self.base_url.join(url) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.reporter.fail(Error::InvalidUrl(url.to_string(), err));
                return;
            }
        };

        let mut expectation = Expectation::new(parsed);
        for option in options {
            option.apply(&mut expectation);
        }

        self.registry.lock().register(expectation);
    }

    /// Reports every required expectation that has not received a request, then lets the
    /// reporter conclude the test.
    ///
    /// With the default [TestReporter] this panics if anything went wrong while the server
    /// was in use. Dropping the server without calling `finish` still panics for failures
    /// seen while serving, but requests that never arrived go unnoticed.
    pub fn finish(&self) {
        {
            let registry = self.registry.lock();
            tracing::debug!("Verifying {} expectation(s)", registry.len());

            for expectation in registry.missing() {
                self.reporter.report(Failure::MissingRequest {
                    url: expectation.url.to_string(),
                });
            }
        }

        self.reporter.conclude();
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        if let Some(join_handle) = self.join_handle.take() {
            match join_handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::warn!("Mock server stopped with an error: {}", err),
                Err(_) => tracing::warn!("Mock server thread panicked"),
            }
        }
    }
}
