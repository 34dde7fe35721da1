use bytes::Bytes;
use serde::Serialize;

use crate::common::data::Expectation;

/// A single setting applied to an expectation when it is registered with
/// [MockServer::expect](crate::MockServer::expect).
///
/// Options are applied in the order they are given, so a later option for the same field
/// overrides an earlier one.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectOption {
    Method(String),
    Status(u16),
    RequestBody(String),
    ResponseBody(Bytes),
    Optional,
}

impl ExpectOption {
    pub(crate) fn apply(self, expectation: &mut Expectation) {
        match self {
            ExpectOption::Method(method) => expectation.method = method,
            ExpectOption::Status(status) => expectation.status = status,
            ExpectOption::RequestBody(body) => expectation.request_body = body,
            ExpectOption::ResponseBody(body) => expectation.response_body = body,
            ExpectOption::Optional => expectation.optional = true,
        }
    }
}

/// Requires the request to use the given HTTP method. The comparison ignores case.
pub fn method<S: Into<String>>(method: S) -> ExpectOption {
    ExpectOption::Method(method.into())
}

/// Responds with the given status code instead of the default `200 OK`.
pub fn status(status: u16) -> ExpectOption {
    ExpectOption::Status(status)
}

/// Requires the request body to equal `value` serialized as JSON, ignoring leading and
/// trailing whitespace.
///
/// Panics if `value` cannot be serialized.
pub fn req_json<T: Serialize + ?Sized>(value: &T) -> ExpectOption {
    let body = serde_json::to_string(value)
        .unwrap_or_else(|err| panic!("Cannot serialize expected request body: {}", err));
    ExpectOption::RequestBody(body)
}

/// Responds with `value` serialized as JSON.
///
/// Panics if `value` cannot be serialized.
pub fn resp_json<T: Serialize + ?Sized>(value: &T) -> ExpectOption {
    let body = serde_json::to_vec(value)
        .unwrap_or_else(|err| panic!("Cannot serialize response body: {}", err));
    ExpectOption::ResponseBody(Bytes::from(body))
}

/// Requires the request body to equal `body`, ignoring leading and trailing whitespace.
pub fn req_body<S: Into<String>>(body: S) -> ExpectOption {
    ExpectOption::RequestBody(body.into())
}

/// Responds with `body` verbatim.
pub fn resp_body<B: Into<Bytes>>(body: B) -> ExpectOption {
    ExpectOption::ResponseBody(body.into())
}

/// Marks the expectation as optional: it is not reported if no request arrives for it.
pub fn optional() -> ExpectOption {
    ExpectOption::Optional
}
