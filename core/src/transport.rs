//! The transport seam and the default ureq-backed implementation.
//!
//! # Design
//! A `Transport` turns an assembled `HttpRequest` into a `Response`. It never
//! interprets status codes: any response that made it back over the wire is a
//! success at this layer, and only connectivity-level failures are errors.
//!
//! `UreqTransport` runs ureq's blocking agent on tokio's blocking pool. ureq
//! is configured with `http_status_as_error(false)` so 4xx/5xx responses come
//! back as data and the request pipeline does the classification. Timeouts are
//! whatever the agent was configured with.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use ureq::ResponseExt;
use url::Url;

use crate::credential::{CredentialStorage, ScopedCredential};
use crate::error::TransportError;
use crate::http::{HttpRequest, Method, Response};

/// Executes HTTP requests on behalf of `Request`.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Perform one round trip.
    async fn submit(&self, request: HttpRequest) -> Result<Response, TransportError>;

    /// Shared store that credentials with session or permanent persistence
    /// are written to. Transports without one ignore persistence.
    fn credential_storage(&self) -> Option<&CredentialStorage> {
        None
    }
}

/// `Transport` backed by a blocking `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    credentials: Arc<CredentialStorage>,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("stored_credentials", &self.credentials.len())
            .finish()
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self::with_agent(agent)
    }
}

impl UreqTransport {
    /// Wrap an existing agent. The agent should be configured with
    /// `http_status_as_error(false)`; otherwise error statuses surface as
    /// transport failures.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self {
            agent,
            credentials: Arc::new(CredentialStorage::new()),
        }
    }

    /// Use `storage` instead of a private credential store.
    pub fn with_credential_storage(mut self, storage: Arc<CredentialStorage>) -> Self {
        self.credentials = storage;
        self
    }

    /// Credential to send preemptively: the one attached to this dispatch,
    /// else the one stored for the request's own protection space.
    fn authorization(&self, request: &HttpRequest) -> Option<String> {
        if request.header("Authorization").is_some() {
            return None;
        }
        request
            .credential
            .clone()
            .or_else(|| self.credentials.scoped(&request.protection_space))
            .filter(|scoped| scoped.applies_to(&request.url))
            .map(|ScopedCredential { credential, .. }| credential.basic_authorization())
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn submit(&self, request: HttpRequest) -> Result<Response, TransportError> {
        let agent = self.agent.clone();
        let authorization = self.authorization(&request);
        tokio::task::spawn_blocking(move || execute(&agent, request, authorization))
            .await
            .map_err(TransportError::new)?
    }

    fn credential_storage(&self) -> Option<&CredentialStorage> {
        Some(&self.credentials)
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &HttpRequest,
    authorization: Option<&str>,
) -> ureq::RequestBuilder<B> {
    for (key, value) in &request.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    if let Some(authorization) = authorization {
        builder = builder.header("Authorization", authorization);
    }
    builder
}

fn execute(
    agent: &ureq::Agent,
    request: HttpRequest,
    authorization: Option<String>,
) -> Result<Response, TransportError> {
    let url = request.url.as_str();
    let auth = authorization.as_deref();
    let body = request.body.as_deref();

    let result = match (request.method, body) {
        (Method::Get, Some(body)) => with_headers(agent.get(url), &request, auth)
            .force_send_body()
            .send(body),
        (Method::Get, None) => with_headers(agent.get(url), &request, auth).call(),
        (Method::Delete, Some(body)) => with_headers(agent.delete(url), &request, auth)
            .force_send_body()
            .send(body),
        (Method::Delete, None) => with_headers(agent.delete(url), &request, auth).call(),
        (Method::Post, Some(body)) => with_headers(agent.post(url), &request, auth).send(body),
        (Method::Post, None) => with_headers(agent.post(url), &request, auth).send_empty(),
        (Method::Put, Some(body)) => with_headers(agent.put(url), &request, auth).send(body),
        (Method::Put, None) => with_headers(agent.put(url), &request, auth).send_empty(),
        (Method::Patch, Some(body)) => with_headers(agent.patch(url), &request, auth).send(body),
        (Method::Patch, None) => with_headers(agent.patch(url), &request, auth).send_empty(),
    };
    let mut response = result.map_err(TransportError::new)?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    // After redirects the response belongs to the last hop.
    let final_url = Url::parse(&response.get_uri().to_string()).unwrap_or(request.url);
    let bytes = response
        .body_mut()
        .read_to_vec()
        .map_err(TransportError::new)?;

    Ok(Response {
        status,
        headers,
        url: final_url,
        body: (!bytes.is_empty()).then(|| Bytes::from(bytes)),
    })
}
