//! HTTP transport consumed by the updater.
//!
//! The updater only needs a HEAD that reports status and `Last-Modified`, and
//! a GET that streams its body into a [`BodySink`]. [`CurlTransport`] is the
//! libcurl implementation.

mod http;
mod parse;
#[cfg(test)]
pub(crate) mod scripted;

pub use http::{CurlTransport, TransportOptions};

use std::io;

pub const HTTP_OK: u32 = 200;
pub const HTTP_NOT_FOUND: u32 = 404;

/// Status line and the headers the updater cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// HTTP status of the final response (after redirects).
    pub status: u32,
    /// `Last-Modified`, if the server sent a non-empty one.
    pub last_modified: Option<String>,
    /// `Content-Length`, if present.
    pub content_length: Option<u64>,
}

impl Response {
    pub fn is_ok(&self) -> bool {
        self.status == HTTP_OK
    }

    pub fn is_not_found(&self) -> bool {
        self.status == HTTP_NOT_FOUND
    }
}

/// Whether a sink wants more body bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// End the transfer early. Not an error.
    Stop,
}

/// Receiver for a streamed response body.
pub trait BodySink {
    /// Called once with the final response before any body bytes (also for
    /// an empty body). Return `false` to discard the body.
    fn begin(&mut self, response: &Response) -> io::Result<bool>;

    /// Called for each body chunk, in order.
    fn write(&mut self, chunk: &[u8]) -> io::Result<Flow>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// libcurl reported an error (DNS, connect, timeout, truncated body...).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// The body sink failed; the transfer was aborted.
    #[error("body sink: {0}")]
    Sink(#[source] io::Error),
    /// The connection failed for a reason not covered above.
    #[error("connection: {0}")]
    Connection(String),
}

/// Blocking HEAD/GET.
pub trait Transport {
    fn head(&mut self, url: &str) -> Result<Response, TransportError>;

    /// GET `url`, feeding the body to `sink`. Returns the final response even
    /// when the sink refused or stopped the body.
    fn get(&mut self, url: &str, sink: &mut dyn BodySink) -> Result<Response, TransportError>;
}
