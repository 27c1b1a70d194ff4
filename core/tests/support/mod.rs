//! In-memory transport for exercising the request pipeline without a network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use requests_core::{
    Configuration, CredentialStorage, HttpRequest, Response, Transport, TransportError,
};

/// What the stub answers with for one submission.
#[derive(Debug, Clone)]
pub enum Reply {
    Status { status: u16, body: Option<Bytes> },
    Fail(String),
}

impl Reply {
    pub fn ok(body: &'static [u8]) -> Self {
        Reply::Status {
            status: 200,
            body: Some(Bytes::from_static(body)),
        }
    }

    pub fn status(status: u16) -> Self {
        Reply::Status { status, body: None }
    }
}

/// Records every submitted request and replays queued replies. When the
/// queue is empty it answers with the fallback reply.
#[derive(Debug)]
pub struct StubTransport {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    submitted: Mutex<Vec<HttpRequest>>,
    credentials: CredentialStorage,
}

impl StubTransport {
    pub fn new(fallback: Reply) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            fallback,
            submitted: Mutex::new(Vec::new()),
            credentials: CredentialStorage::new(),
        })
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().push_back(reply);
    }

    pub fn submitted(&self) -> Vec<HttpRequest> {
        self.submitted.lock().clone()
    }

    pub fn last(&self) -> HttpRequest {
        self.submitted
            .lock()
            .last()
            .cloned()
            .expect("no request was submitted")
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn submit(&self, request: HttpRequest) -> Result<Response, TransportError> {
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let url = request.url.clone();
        self.submitted.lock().push(request);
        match reply {
            Reply::Status { status, body } => Ok(Response {
                status,
                headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                url,
                body,
            }),
            Reply::Fail(message) => Err(TransportError::new(message)),
        }
    }

    fn credential_storage(&self) -> Option<&CredentialStorage> {
        Some(&self.credentials)
    }
}

/// Default configuration whose default transport is `transport`.
pub fn configuration(transport: Arc<StubTransport>) -> Arc<Configuration> {
    Arc::new(Configuration::default().with_transport(transport))
}
