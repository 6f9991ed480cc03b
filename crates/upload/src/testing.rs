//! Scripted [`Transport`] for tests.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use crate::error::ClientError;
use crate::transport::{Request, Response, Transport};

/// Replays a scripted sequence of responses and records every request.
pub(crate) struct MockTransport {
    script: Mutex<VecDeque<Result<Response, ClientError>>>,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, resp: Response) {
        self.script.lock().unwrap().push_back(Ok(resp));
    }

    pub fn push_error(&self, err: ClientError) {
        self.script.lock().unwrap().push_back(Err(err));
    }

    /// Requests executed so far, in order.
    pub fn recorded(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    fn execute(
        &self,
        req: Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response, ClientError>> + Send + '_>> {
        let scripted = self.script.lock().unwrap().pop_front();
        self.requests.lock().unwrap().push(req.clone());
        Box::pin(async move {
            match scripted {
                Some(result) => result,
                None => panic!(
                    "no scripted response left for {} {}",
                    req.method.as_str(),
                    req.path
                ),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Response builders
// ---------------------------------------------------------------------------

pub(crate) fn ok() -> Response {
    Response {
        status: 200,
        ..Default::default()
    }
}

pub(crate) fn ok_with_upload_id(id: &str) -> Response {
    Response {
        upload_id: Some(id.to_string()),
        ..ok()
    }
}

pub(crate) fn ok_with_range(range: &str) -> Response {
    Response {
        range: Some(range.to_string()),
        ..ok()
    }
}

pub(crate) fn ok_with_etag(etag: &str) -> Response {
    Response {
        etag: Some(etag.to_string()),
        ..ok()
    }
}

pub(crate) fn status(code: u16) -> Response {
    Response {
        status: code,
        ..Default::default()
    }
}
