use bytes::Bytes;
use url::Url;

/// A single registered rule: the request the mock server anticipates and the response it
/// returns for it.
///
/// Empty constraint fields mean "not checked". A `status` of `0` leaves the response status
/// at the transport default.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expectation {
    pub url: Url,
    pub method: String,
    pub request_body: String,
    pub status: u16,
    pub response_body: Bytes,
    pub optional: bool,
    pub(crate) called: bool,
}

impl Expectation {
    pub(crate) fn new(url: Url) -> Self {
        Self {
            url,
            method: String::new(),
            request_body: String::new(),
            status: 0,
            response_body: Bytes::new(),
            optional: false,
            called: false,
        }
    }

    pub(crate) fn is_missing(&self) -> bool {
        !self.optional && !self.called
    }
}
