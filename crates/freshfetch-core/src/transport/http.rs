//! libcurl-backed `Transport`.
//!
//! HEAD collects header lines through `Easy`; GET drives an `Easy2` handler
//! that hands the final status to the sink before the first body byte.

use std::io;
use std::str;
use std::time::Duration;

use curl::easy::{Easy, Easy2, Handler, WriteError};

use super::parse::{parse_headers, parse_status_line};
use super::{BodySink, Flow, Response, Transport, TransportError};

/// Timeouts and redirect limits applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    /// Hard cap on a whole request, body included.
    pub timeout: Duration,
    /// Abort when throughput stays below this many bytes/s ...
    pub low_speed_limit: u32,
    /// ... for this long.
    pub low_speed_time: Duration,
    pub max_redirections: u32,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(300),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            max_redirections: 10,
        }
    }
}

/// Blocking HTTP over libcurl. One handle per request; nothing is shared
/// between calls.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    options: TransportOptions,
}

impl CurlTransport {
    pub fn new(options: TransportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }
}

macro_rules! configure {
    ($easy:expr, $url:expr, $opts:expr) => {{
        $easy.url($url)?;
        $easy.follow_location(true)?;
        $easy.max_redirections($opts.max_redirections)?;
        $easy.connect_timeout($opts.connect_timeout)?;
        $easy.timeout($opts.timeout)?;
        $easy.low_speed_limit($opts.low_speed_limit)?;
        $easy.low_speed_time($opts.low_speed_time)?;
    }};
}

impl Transport for CurlTransport {
    fn head(&mut self, url: &str) -> Result<Response, TransportError> {
        let mut headers: Vec<String> = Vec::new();

        let mut easy = Easy::new();
        configure!(easy, url, self.options);
        easy.nobody(true)?; // HEAD request

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.perform()?;
        }

        let mut response = parse_headers(&headers);
        response.status = easy.response_code()?;
        tracing::debug!(
            url,
            status = response.status,
            last_modified = ?response.last_modified,
            content_length = ?response.content_length,
            "HEAD response"
        );
        Ok(response)
    }

    fn get(&mut self, url: &str, sink: &mut dyn BodySink) -> Result<Response, TransportError> {
        let mut easy = Easy2::new(SinkHandler::new(sink));
        configure!(easy, url, self.options);

        let performed = easy.perform();
        let code = easy.response_code();

        let handler = easy.get_mut();
        if let Some(e) = handler.error.take() {
            return Err(TransportError::Sink(e));
        }
        match performed {
            Ok(()) => {}
            // The handler returned 0 on purpose: body refused or sink stopped.
            Err(e) if e.is_write_error() && handler.stopped => {}
            Err(e) => return Err(e.into()),
        }

        let mut response = parse_headers(&handler.headers);
        response.status = code?;
        if handler.accepted.is_none() {
            // No body bytes arrived; the sink still gets its `begin`.
            handler
                .sink
                .begin(&response)
                .map_err(TransportError::Sink)?;
        }
        tracing::debug!(url, status = response.status, "GET response");
        Ok(response)
    }
}

/// Easy2 handler that forwards headers and body to a `BodySink`.
struct SinkHandler<'a> {
    sink: &'a mut dyn BodySink,
    headers: Vec<String>,
    /// None = `begin` not called yet.
    accepted: Option<bool>,
    stopped: bool,
    error: Option<io::Error>,
}

impl<'a> SinkHandler<'a> {
    fn new(sink: &'a mut dyn BodySink) -> Self {
        Self {
            sink,
            headers: Vec::new(),
            accepted: None,
            stopped: false,
            error: None,
        }
    }
}

impl Handler for SinkHandler<'_> {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(s) = str::from_utf8(data) {
            let line = s.trim_end();
            if parse_status_line(line).is_some() {
                self.headers.clear();
            }
            self.headers.push(line.to_string());
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        if self.accepted.is_none() {
            let response = parse_headers(&self.headers);
            match self.sink.begin(&response) {
                Ok(accepted) => self.accepted = Some(accepted),
                Err(e) => {
                    self.error = Some(e);
                    return Ok(0);
                }
            }
        }
        if self.accepted == Some(false) {
            self.stopped = true;
            return Ok(0);
        }
        match self.sink.write(data) {
            Ok(Flow::Continue) => Ok(data.len()),
            Ok(Flow::Stop) => {
                self.stopped = true;
                Ok(0)
            }
            Err(e) => {
                self.error = Some(e);
                Ok(0)
            }
        }
    }
}
