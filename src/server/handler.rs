use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{header, Request, Response, StatusCode};
use url::Url;

use crate::{
    report::{Error, Failure, Reporter},
    server::{state::ExpectationRegistry, validator},
};

#[async_trait]
pub(crate) trait Handler {
    async fn handle(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error>;
}

/// Answers every request from the registered expectations.
pub(crate) struct ExpectationHandler {
    registry: Arc<ExpectationRegistry>,
    reporter: Arc<dyn Reporter>,
}

impl ExpectationHandler {
    pub(crate) fn new(registry: Arc<ExpectationRegistry>, reporter: Arc<dyn Reporter>) -> Self {
        Self { registry, reporter }
    }
}

#[async_trait]
impl Handler for ExpectationHandler {
    async fn handle(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error> {
        tracing::trace!("Matching incoming request: {:?}", req);

        let url = match request_url(&req) {
            Some(url) => url,
            None => {
                self.reporter.report(Failure::UnexpectedRequest {
                    url: req.uri().to_string(),
                });
                return not_found();
            }
        };

        // Matching, validation and building the response all happen under one lock, so
        // concurrent requests are answered strictly one after another.
        let mut registry = self.registry.lock();
        match registry.claim(&url) {
            Some(expectation) => validator::respond(expectation, &req, self.reporter.as_ref()),
            None => {
                self.reporter.report(Failure::UnexpectedRequest {
                    url: url.to_string(),
                });
                not_found()
            }
        }
    }
}

/// Reconstructs the absolute URL of a request. Clients send origin-form targets ("/path")
/// along with a Host header, so the authority is taken from the header in that case.
fn request_url(req: &Request<Bytes>) -> Option<Url> {
    let uri = req.uri();
    if uri.scheme().is_some() && uri.authority().is_some() {
        return Url::parse(&uri.to_string()).ok();
    }

    let host = req.headers().get(header::HOST)?.to_str().ok()?;
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    Url::parse(&format!("http://{}{}", host, path_and_query)).ok()
}

fn not_found() -> Result<Response<Bytes>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Bytes::new())?)
}
