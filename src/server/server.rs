use std::{
    convert::Infallible,
    future::Future,
    net::SocketAddr,
    sync::Arc,
};

use futures_util::FutureExt;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::{
    body::{Bytes, Incoming},
    server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot::Sender,
    task::spawn,
};

use crate::{
    common::util::{parse_bool, read_env},
    report::{self, Reporter},
    server::{
        handler::Handler,
        server::Error::{LocalSocketAddrError, PublishSocketAddrError, SocketBindError},
    },
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot bind to socket addr {0}: {1}")]
    SocketBindError(SocketAddr, std::io::Error),
    #[error("cannot parse socket address: {0}")]
    SocketAddrParseError(#[from] std::net::AddrParseError),
    #[error("cannot obtain local address: {0}")]
    LocalSocketAddrError(std::io::Error),
    #[error("cannot send reserved TCP address to test thread {0}")]
    PublishSocketAddrError(SocketAddr),
    #[error("cannot build server runtime: {0}")]
    RuntimeError(std::io::Error),
}

impl From<Error> for report::Error {
    fn from(err: Error) -> Self {
        match err {
            SocketBindError(addr, err) => report::Error::Bind(addr, err),
            other => report::Error::Startup(other.to_string()),
        }
    }
}

/// Settings for the listener behind a [MockServer](crate::MockServer).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockServerConfig {
    /// Port to listen on. `None` lets the operating system pick a free one.
    pub static_port: Option<u16>,
    /// Listen on all interfaces instead of the loopback interface only.
    pub expose: bool,
    /// Log one line per answered request at `info` level.
    pub print_access_log: bool,
}

impl MockServerConfig {
    /// Reads the configuration from `GUBBINS_MOCK_PORT`, `GUBBINS_MOCK_EXPOSE` and
    /// `GUBBINS_MOCK_ACCESS_LOG`. Unset variables fall back to the defaults.
    ///
    /// Panics if a variable is set to a value that cannot be parsed.
    pub fn from_env() -> Self {
        let port = read_env("GUBBINS_MOCK_PORT", "");
        let static_port = match port.as_str() {
            "" => None,
            port => Some(
                port.parse::<u16>()
                    .expect("Cannot parse environment variable GUBBINS_MOCK_PORT to a port"),
            ),
        };

        Self {
            static_port,
            expose: env_flag("GUBBINS_MOCK_EXPOSE"),
            print_access_log: env_flag("GUBBINS_MOCK_ACCESS_LOG"),
        }
    }
}

fn env_flag(name: &str) -> bool {
    let value = read_env(name, "false");
    match parse_bool(&value) {
        Some(flag) => flag,
        None => panic!(
            "Cannot parse environment variable {} to a boolean: {:?}",
            name, value
        ),
    }
}

/// A minimal HTTP/1.1 server that passes every buffered request to a [Handler].
pub(crate) struct HttpServer<H>
where
    H: Handler + Send + Sync + 'static,
{
    handler: H,
    config: MockServerConfig,
    reporter: Arc<dyn Reporter>,
}

impl<H> HttpServer<H>
where
    H: Handler + Send + Sync + 'static,
{
    pub(crate) fn new(handler: H, config: MockServerConfig, reporter: Arc<dyn Reporter>) -> Self {
        HttpServer {
            handler,
            config,
            reporter,
        }
    }

    /// Binds the listener, publishes its address through `socket_addr_sender` and serves
    /// connections until `shutdown` resolves.
    pub(crate) async fn start_with_signals<F>(
        self,
        socket_addr_sender: Option<Sender<SocketAddr>>,
        shutdown: F,
    ) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let host = if self.config.expose {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };
        let addr: SocketAddr =
            format!("{}:{}", host, self.config.static_port.unwrap_or(0)).parse()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| SocketBindError(addr, e))?;
        let addr = listener.local_addr().map_err(LocalSocketAddrError)?;

        if let Some(sender) = socket_addr_sender {
            sender.send(addr).map_err(PublishSocketAddrError)?;
        }

        tracing::info!("Listening on {}", addr);
        self.run_accept_loop(listener, shutdown).await;
        tracing::debug!("Server on {} shut down", addr);

        Ok(())
    }

    async fn run_accept_loop<F>(self, listener: TcpListener, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let shutdown = shutdown.shared();
        let server = Arc::new(self);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((tcp_stream, remote_address)) => {
                            let server = server.clone();
                            spawn(async move {
                                server.serve_connection(tcp_stream, remote_address).await;
                            });
                        },
                        Err(err) => {
                            tracing::error!("TCP error: {:?}", err);
                        },
                    };
                }
                _ = shutdown.clone() => {
                    break;
                }
            }
        }
    }

    async fn serve_connection(self: Arc<Self>, tcp_stream: TcpStream, remote_address: SocketAddr) {
        tracing::trace!("New TCP connection from {}", remote_address);

        let result = http1::Builder::new()
            .serve_connection(
                TokioIo::new(tcp_stream),
                service_fn(|req| self.clone().service(req)),
            )
            .await;

        if let Err(err) = result {
            if err.is_incomplete_message() || err.is_canceled() || err.is_closed() {
                tracing::debug!("Connection from {} ended early: {}", remote_address, err);
            } else {
                self.reporter.fail(report::Error::Connection(err));
            }
        }
    }

    async fn service(
        self: Arc<Self>,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, Infallible> {
        tracing::trace!("New HTTP request received: {}", req.uri());

        // The whole body is read before matching, whether or not any expectation looks at it.
        let req = match buffer_request(req).await {
            Ok(req) => req,
            Err(err) => return Ok(self.error_response(report::Error::Connection(err))),
        };

        let method = req.method().clone();
        let uri = req.uri().clone();

        let res = match self.handler.handle(req).await {
            Ok(res) => to_service_response(res),
            Err(err) => self.error_response(err),
        };

        if self.config.print_access_log {
            tracing::info!("{} {} -> {}", method, uri, res.status());
        }

        Ok(res)
    }

    fn error_response(&self, err: report::Error) -> Response<Full<Bytes>> {
        let body = err.to_string();
        self.reporter.fail(err);

        let mut res = Response::new(Full::new(Bytes::from(body)));
        *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        res
    }
}

async fn buffer_request(req: Request<Incoming>) -> Result<Request<Bytes>, hyper::Error> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes();
    Ok(Request::from_parts(parts, body))
}

fn to_service_response(response: Response<Bytes>) -> Response<Full<Bytes>> {
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Full::new(body))
}
