use bytes::Bytes;
use http::{Request, Response, StatusCode};

use crate::{
    assert::{equal, equal_bytes},
    common::data::Expectation,
    report::{Error, Reporter},
};

/// Checks `req` against the constraints of the expectation it was matched to and builds the
/// canned response.
///
/// Constraint violations are reported as non-fatal mismatches and the response is produced
/// anyway. Only a response that cannot be built is an error.
pub(crate) fn respond(
    expectation: &Expectation,
    req: &Request<Bytes>,
    reporter: &dyn Reporter,
) -> Result<Response<Bytes>, Error> {
    validate(expectation, req, reporter);

    let mut builder = Response::builder();
    if expectation.status != 0 {
        let status = StatusCode::from_u16(expectation.status)
            .map_err(|_| Error::InvalidStatus(expectation.status))?;
        builder = builder.status(status);
    }

    Ok(builder.body(expectation.response_body.clone())?)
}

fn validate(expectation: &Expectation, req: &Request<Bytes>, reporter: &dyn Reporter) {
    if !expectation.method.is_empty() {
        equal(
            reporter,
            "method",
            &expectation.method.to_uppercase(),
            &req.method().as_str().to_uppercase(),
        );
    }

    if !expectation.request_body.is_empty() {
        let want = expectation.request_body.trim();
        match std::str::from_utf8(req.body()) {
            Ok(body) => equal(reporter, "request", want, body.trim()),
            // Invalid UTF-8 can never equal the expected string.
            Err(_) => equal_bytes(reporter, "request", want.as_bytes(), req.body().trim_ascii()),
        };
    }
}
