//! Canned transport for unit tests.

use super::{BodySink, Flow, Response, Transport, TransportError, HTTP_NOT_FOUND, HTTP_OK};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// Transport-level failure (no HTTP response at all).
    Fail(&'static str),
    Respond {
        response: Response,
        body: Vec<u8>,
        /// Drop the connection after this many body bytes.
        cut_after: Option<usize>,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct ScriptedTransport {
    pub head: Reply,
    pub get: Reply,
    pub head_calls: usize,
    pub get_calls: usize,
    /// Body bytes the sink actually consumed on the last GET.
    pub delivered: usize,
    pub chunk: usize,
}

impl ScriptedTransport {
    /// HEAD and GET both answer 200 with `last_modified` and `body`.
    pub fn serving(last_modified: Option<&str>, body: &[u8]) -> Self {
        let response = Response {
            status: HTTP_OK,
            last_modified: last_modified.map(str::to_string),
            content_length: Some(body.len() as u64),
        };
        Self {
            head: Reply::Respond {
                response: response.clone(),
                body: Vec::new(),
                cut_after: None,
            },
            get: Reply::Respond {
                response,
                body: body.to_vec(),
                cut_after: None,
            },
            head_calls: 0,
            get_calls: 0,
            delivered: 0,
            chunk: 2,
        }
    }

    pub fn not_found() -> Self {
        let mut t = Self::serving(None, b"");
        let response = Response {
            status: HTTP_NOT_FOUND,
            ..Response::default()
        };
        t.head = Reply::Respond {
            response: response.clone(),
            body: Vec::new(),
            cut_after: None,
        };
        t.get = Reply::Respond {
            response,
            body: b"not found".to_vec(),
            cut_after: None,
        };
        t
    }

    pub fn with_get(mut self, get: Reply) -> Self {
        self.get = get;
        self
    }

    pub fn with_head(mut self, head: Reply) -> Self {
        self.head = head;
        self
    }

    pub fn calls(&self) -> usize {
        self.head_calls + self.get_calls
    }
}

impl Transport for ScriptedTransport {
    fn head(&mut self, _url: &str) -> Result<Response, TransportError> {
        self.head_calls += 1;
        match &self.head {
            Reply::Fail(msg) => Err(TransportError::Connection(msg.to_string())),
            Reply::Respond { response, .. } => Ok(response.clone()),
        }
    }

    fn get(&mut self, _url: &str, sink: &mut dyn BodySink) -> Result<Response, TransportError> {
        self.get_calls += 1;
        self.delivered = 0;
        let (response, body, cut_after) = match &self.get {
            Reply::Fail(msg) => return Err(TransportError::Connection(msg.to_string())),
            Reply::Respond {
                response,
                body,
                cut_after,
            } => (response.clone(), body.clone(), *cut_after),
        };
        let sent = cut_after.map_or(body.len(), |n| n.min(body.len()));
        if sink.begin(&response).map_err(TransportError::Sink)? {
            for chunk in body[..sent].chunks(self.chunk.max(1)) {
                self.delivered += chunk.len();
                if sink.write(chunk).map_err(TransportError::Sink)? == Flow::Stop {
                    break;
                }
            }
        }
        if cut_after.is_some() {
            return Err(TransportError::Connection("connection reset by peer".into()));
        }
        Ok(response)
    }
}
